/// OAuth 2.0 device authorization grant against Entra ID.
///
/// The interactive strategy: prints a verification URL and user code, then
/// polls the token endpoint until the user completes sign-in in a browser.
use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info};

use super::{AccessToken, TokenCredential};

/// The Azure CLI's well-known public client id, usable without registering
/// an application of our own.
const DEFAULT_CLIENT_ID: &str = "04b07795-8ddb-461a-bbee-02f9e1bf7b46";
const DEFAULT_TENANT: &str = "organizations";

pub struct DeviceCodeCredential {
    http: Client,
    tenant_id: String,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    interval: u64,
    expires_in: u64,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Whether a token-endpoint error means "keep polling".
fn is_pending(error_code: &str) -> bool {
    matches!(error_code, "authorization_pending" | "slow_down")
}

impl DeviceCodeCredential {
    /// Reads `AZURE_TENANT_ID` and `AZURE_CLIENT_ID`, falling back to the
    /// multi-tenant defaults so the tool works with zero configuration.
    pub fn from_env() -> Result<Self> {
        let tenant_id = env::var("AZURE_TENANT_ID").unwrap_or_else(|_| DEFAULT_TENANT.to_string());
        let client_id =
            env::var("AZURE_CLIENT_ID").unwrap_or_else(|_| DEFAULT_CLIENT_ID.to_string());

        let http = Client::builder()
            .user_agent("entra-token-gen/0.1")
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            tenant_id,
            client_id,
        })
    }

    fn device_code_url(&self) -> String {
        format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/devicecode",
            self.tenant_id
        )
    }

    fn token_url(&self) -> String {
        format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.tenant_id
        )
    }
}

#[async_trait]
impl TokenCredential for DeviceCodeCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        debug!(scope = %scope, tenant_id = %self.tenant_id, "auth: starting device code flow");

        let params = [("client_id", self.client_id.as_str()), ("scope", scope)];
        let response = self
            .http
            .post(self.device_code_url())
            .form(&params)
            .send()
            .await
            .context("failed to send device code request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("device code request failed: {} - {}", status, body);
        }

        let device: DeviceCodeResponse = response
            .json()
            .await
            .context("failed to parse device code response")?;

        match &device.message {
            Some(message) => println!("\n{}\n", message),
            None => println!(
                "\nTo sign in, visit {} and enter the code {}\n",
                device.verification_uri, device.user_code
            ),
        }

        let deadline = tokio::time::Instant::now() + Duration::from_secs(device.expires_in);
        let mut interval = device.interval.max(1);

        loop {
            sleep(Duration::from_secs(interval)).await;
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("device code expired before sign-in completed");
            }

            let poll_params = [
                ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
                ("client_id", self.client_id.as_str()),
                ("device_code", device.device_code.as_str()),
            ];
            let response = self
                .http
                .post(self.token_url())
                .form(&poll_params)
                .send()
                .await
                .context("failed to poll token endpoint")?;

            if response.status().is_success() {
                let token: TokenResponse = response
                    .json()
                    .await
                    .context("failed to parse token response")?;
                info!(scope = %scope, "auth: device code sign-in complete");
                return Ok(AccessToken {
                    expires_on: Some(Utc::now() + chrono::Duration::seconds(token.expires_in)),
                    token: token.access_token,
                });
            }

            let body = response.text().await.unwrap_or_default();
            let error: TokenErrorResponse = serde_json::from_str(&body)
                .with_context(|| format!("unexpected token endpoint response: {}", body))?;

            if !is_pending(&error.error) {
                anyhow::bail!(
                    "device code sign-in failed: {} - {}",
                    error.error,
                    error.error_description.unwrap_or_default()
                );
            }
            if error.error == "slow_down" {
                interval += 5;
            }
        }
    }
}
