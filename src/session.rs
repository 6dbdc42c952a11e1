/// The interactive token generation loop.
///
/// SelectingApplication -> RequestingToken -> PresentingResult ->
/// AskContinue, looping while the user wants another token. Cancellation
/// from any prompt unwinds through `?` and ends the whole session.
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::auth::{AccessToken, TokenCredential};
use crate::clipboard::ClipboardWriter;
use crate::filter;
use crate::graph::{eligible_applications, Application, GraphClient};
use crate::prompt;

pub struct Session {
    credential: Arc<dyn TokenCredential>,
    graph: GraphClient,
    /// Application list cache, filled on first fetch and kept for the
    /// process lifetime.
    applications: Option<Vec<Application>>,
    clipboard: ClipboardWriter,
}

impl Session {
    pub fn new(credential: Arc<dyn TokenCredential>) -> Result<Self> {
        let graph = GraphClient::new(Arc::clone(&credential))?;
        Ok(Self {
            credential,
            graph,
            applications: None,
            clipboard: ClipboardWriter::new(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            let applications = self.applications().await?;
            let names: Vec<String> = applications
                .iter()
                .filter_map(|app| app.display_name.clone())
                .collect();

            let filtered = filter::run_filter(names, "application containing the app role")?;
            let choice = prompt::select(
                "Select the application containing the app role:",
                &filtered,
            )?;

            let selected = resolve_application(&applications, &filtered[choice])
                .with_context(|| format!("application '{}' not found", filtered[choice]))?;
            let scope = derive_scope(selected)?;

            info!(scope = %scope, "session: requesting access token");
            println!("\nRequesting access token for scope {}...", scope);

            // Held as a value so a failed request only skips presentation,
            // never the rest of the loop.
            let outcome = self.credential.get_token(&scope).await;
            present_outcome(&outcome, |text| self.clipboard.copy(text));

            if !prompt::confirm("Do you want to generate another access token?")? {
                break;
            }
        }
        Ok(())
    }

    async fn applications(&mut self) -> Result<&[Application]> {
        if self.applications.is_none() {
            let fetched = eligible_applications(self.graph.list_applications().await?);
            if fetched.is_empty() {
                anyhow::bail!("no applications with an app role and identifier URI were found");
            }
            self.applications = Some(fetched);
        }
        Ok(self.applications.as_deref().unwrap_or_default())
    }
}

/// Resolves a display name picked from the filtered list back to its
/// application, matching case-insensitively.
fn resolve_application<'a>(
    applications: &'a [Application],
    display_name: &str,
) -> Option<&'a Application> {
    applications.iter().find(|app| {
        app.display_name
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(display_name))
    })
}

/// Scope for the token request: the application's first identifier URI
/// with the `.default` suffix.
fn derive_scope(application: &Application) -> Result<String> {
    let uri = application
        .identifier_uris
        .first()
        .context("application has no identifier URIs")?;
    Ok(format!("{}/.default", uri.trim_end_matches('/')))
}

fn present_outcome(outcome: &Result<AccessToken>, copy: impl FnMut(&str) -> Result<()>) {
    match outcome {
        Ok(token) => present_token(token, copy),
        Err(err) => {
            error!(err = %err, "session: token request failed");
            eprintln!("\nFailed to acquire the access token: {:#}\n", err);
        }
    }
}

fn present_token(token: &AccessToken, mut copy: impl FnMut(&str) -> Result<()>) {
    match copy(&token.token) {
        Ok(()) => println!("\nThe access token has been copied to your clipboard.\n"),
        Err(err) => {
            warn!(err = %err, "session: clipboard write failed");
            println!("\nFailed to copy the access token to clipboard. Falling back to printing to console:\n");
        }
    }
    println!("{}", token.token);
    if let Some(expires_on) = token.expires_on {
        println!("\nExpires: {}", expires_on.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AppRole;

    fn app(name: &str, uris: &[&str]) -> Application {
        Application {
            display_name: Some(name.to_string()),
            app_roles: vec![AppRole {
                id: Some("1".to_string()),
                value: Some("Data.Read".to_string()),
                display_name: Some("Read data".to_string()),
            }],
            identifier_uris: uris.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn test_resolve_application_is_case_insensitive() {
        let apps = vec![app("Billing API", &["api://billing"])];
        assert!(resolve_application(&apps, "billing api").is_some());
        assert!(resolve_application(&apps, "BILLING API").is_some());
        assert!(resolve_application(&apps, "Inventory").is_none());
    }

    #[test]
    fn test_derive_scope_uses_first_identifier_uri() {
        let application = app("Billing API", &["api://billing", "api://billing-alt"]);
        assert_eq!(derive_scope(&application).unwrap(), "api://billing/.default");
    }

    #[test]
    fn test_derive_scope_trims_trailing_slash() {
        let application = app("Billing API", &["https://contoso.com/billing/"]);
        assert_eq!(
            derive_scope(&application).unwrap(),
            "https://contoso.com/billing/.default"
        );
    }

    #[test]
    fn test_derive_scope_fails_without_uris() {
        let application = app("No URIs", &[]);
        assert!(derive_scope(&application).is_err());
    }

    #[test]
    fn test_present_token_survives_clipboard_failure() {
        let token = AccessToken {
            token: "tok".to_string(),
            expires_on: None,
        };
        // The fallback path must not propagate the clipboard error.
        let mut attempts = 0;
        present_token(&token, |text| {
            attempts += 1;
            assert_eq!(text, "tok");
            anyhow::bail!("no clipboard in test")
        });
        assert_eq!(attempts, 1);
        present_token(&token, |_| Ok(()));
    }

    #[test]
    fn test_failed_token_outcome_is_presentable() {
        let outcome: Result<AccessToken> = Err(anyhow::anyhow!("network unreachable"));
        // Display-only; the session loop continues after this, and the
        // clipboard is never touched.
        present_outcome(&outcome, |_| panic!("clipboard must not be used on error"));
    }
}
