/// Token acquisition via the locally logged-in Azure CLI session.
///
/// Shells out to `az account get-access-token` per scope; no secrets or
/// configuration are read by this program itself.
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::{AccessToken, TokenCredential};

pub struct AzureCliCredential;

impl AzureCliCredential {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct AzTokenOutput {
    #[serde(rename = "accessToken")]
    access_token: String,
    /// Unix timestamp, present in recent az versions.
    #[serde(rename = "expires_on")]
    expires_on: Option<i64>,
}

fn parse_az_output(stdout: &[u8]) -> Result<AccessToken> {
    let parsed: AzTokenOutput =
        serde_json::from_slice(stdout).context("failed to parse az CLI token output")?;
    let expires_on = parsed
        .expires_on
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    Ok(AccessToken {
        token: parsed.access_token,
        expires_on,
    })
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        debug!(scope = %scope, "auth: requesting token from az CLI");

        let output = Command::new("az")
            .args(["account", "get-access-token", "--scope", scope, "--output", "json"])
            .output()
            .await
            .context("failed to run the az CLI - is it installed and on PATH?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "az CLI token request for scope '{}' failed: {}. Make sure you're logged in with 'az login'",
                scope,
                stderr.trim()
            );
        }

        parse_az_output(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_az_output_with_unix_expiry() {
        let raw = br#"{
            "accessToken": "eyJ0eXAi.token.value",
            "expiresOn": "2026-08-29 14:00:00.000000",
            "expires_on": 1788098400,
            "subscription": "sub-id",
            "tenant": "tenant-id",
            "tokenType": "Bearer"
        }"#;
        let token = parse_az_output(raw).unwrap();
        assert_eq!(token.token, "eyJ0eXAi.token.value");
        assert_eq!(token.expires_on.unwrap().timestamp(), 1788098400);
    }

    #[test]
    fn test_parse_az_output_without_expiry_field() {
        let raw = br#"{"accessToken": "tok", "tokenType": "Bearer"}"#;
        let token = parse_az_output(raw).unwrap();
        assert_eq!(token.token, "tok");
        assert!(token.expires_on.is_none());
    }

    #[test]
    fn test_parse_az_output_rejects_garbage() {
        assert!(parse_az_output(b"not json").is_err());
    }
}
