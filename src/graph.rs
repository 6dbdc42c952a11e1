/// Microsoft Graph application listing.
///
/// Pages through `/v1.0/applications` until `@odata.nextLink` is drained.
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::TokenCredential;

pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

const APPLICATIONS_URL: &str =
    "https://graph.microsoft.com/v1.0/applications?$select=displayName,appRoles,identifierUris&$top=100";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub display_name: Option<String>,
    #[serde(default)]
    pub app_roles: Vec<AppRole>,
    #[serde(default)]
    pub identifier_uris: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRole {
    pub id: Option<String>,
    pub value: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApplicationPage {
    #[serde(default)]
    value: Vec<Application>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// Keeps only applications a token can meaningfully be requested for: a
/// display name to select by, at least one app role, and at least one
/// identifier URI to derive the scope from.
pub fn eligible_applications(applications: Vec<Application>) -> Vec<Application> {
    applications
        .into_iter()
        .filter(|app| {
            app.display_name.is_some()
                && !app.app_roles.is_empty()
                && !app.identifier_uris.is_empty()
        })
        .collect()
}

pub struct GraphClient {
    http: Client,
    credential: Arc<dyn TokenCredential>,
}

impl GraphClient {
    pub fn new(credential: Arc<dyn TokenCredential>) -> Result<Self> {
        let http = Client::builder()
            .user_agent("entra-token-gen/0.1")
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, credential })
    }

    /// Fetches every registered application, following pagination links
    /// until the listing is complete.
    pub async fn list_applications(&self) -> Result<Vec<Application>> {
        let token = self
            .credential
            .get_token(GRAPH_SCOPE)
            .await
            .context("failed to acquire a Microsoft Graph token")?;

        drain_pages(APPLICATIONS_URL.to_string(), |url| {
            let http = self.http.clone();
            let bearer = token.token.clone();
            async move { fetch_page(http, bearer, url).await }
        })
        .await
    }
}

async fn fetch_page(http: Client, bearer: String, url: String) -> Result<ApplicationPage> {
    let response = http
        .get(&url)
        .bearer_auth(&bearer)
        .send()
        .await
        .context("failed to send Graph applications request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Graph applications request failed: {} - {}", status, body);
    }

    response
        .json()
        .await
        .context("failed to parse Graph applications page")
}

/// Accumulates applications from `fetch`ed pages, following each page's
/// `@odata.nextLink` from `start` until a page carries none.
async fn drain_pages<F, Fut>(start: String, mut fetch: F) -> Result<Vec<Application>>
where
    F: FnMut(String) -> Fut,
    Fut: std::future::Future<Output = Result<ApplicationPage>>,
{
    let mut applications = Vec::new();
    let mut url = start;
    let mut pages = 0usize;

    loop {
        let page = fetch(url).await?;
        pages += 1;
        applications.extend(page.value);
        debug!(pages, fetched = applications.len(), "graph: page received");
        print!("\rFetching applications... {} found", applications.len());
        let _ = std::io::stdout().flush();

        match page.next_link {
            Some(next) => url = next,
            None => break,
        }
    }
    println!();

    info!(
        count = applications.len(),
        pages, "graph: application listing complete"
    );
    Ok(applications)
}
