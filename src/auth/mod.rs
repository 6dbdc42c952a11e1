/// Credential selection for Microsoft Entra ID.
///
/// Two strategies: reuse the local `az` CLI session, or run the OAuth 2.0
/// device authorization grant. Both produce a [`TokenCredential`] the rest
/// of the program uses to mint tokens for arbitrary scopes.
pub mod azure_cli;
pub mod device_code;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::prompt;

pub use azure_cli::AzureCliCredential;
pub use device_code::DeviceCodeCredential;

/// A short-lived bearer token for a single scope.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Acquires an access token for `scope`, e.g.
    /// `https://graph.microsoft.com/.default`.
    async fn get_token(&self, scope: &str) -> Result<AccessToken>;
}

/// Prompts for the authentication method and builds the matching credential.
pub fn select_credential() -> Result<Arc<dyn TokenCredential>> {
    let choice = prompt::select(
        "Select the authentication method:",
        &["azure-cli", "device-code"],
    )?;

    let credential: Arc<dyn TokenCredential> = match choice {
        0 => Arc::new(AzureCliCredential::new()),
        _ => Arc::new(DeviceCodeCredential::from_env()?),
    };
    Ok(credential)
}
