// OAuth bearer tokens for the Google Cloud REST APIs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before the metadata server says they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug)]
pub struct TokenProvider {
    client: reqwest::Client,
    fixed: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Use `access_token` when configured, else the instance service account
    pub fn new(client: reqwest::Client, access_token: Option<String>) -> Self {
        Self {
            client,
            fixed: access_token.filter(|t| !t.is_empty()),
            cached: Mutex::new(None),
        }
    }

    pub async fn bearer(&self) -> Result<String> {
        if let Some(token) = &self.fixed {
            return Ok(token.clone());
        }

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.value.clone());
        }

        let token = self.fetch_from_metadata().await?;
        let refresh_at = Instant::now()
            + Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        tracing::debug!(expires_in = token.expires_in, "refreshed metadata access token");

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at,
        });
        Ok(token.access_token)
    }

    async fn fetch_from_metadata(&self) -> Result<MetadataToken> {
        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .context("Failed to reach the metadata server for an access token")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Metadata token request failed with status {}: {}", status, body);
        }

        response
            .json::<MetadataToken>()
            .await
            .context("Failed to parse metadata token response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_token_skips_metadata() {
        let provider = TokenProvider::new(reqwest::Client::new(), Some("ya29.token".to_string()));
        assert_eq!(provider.bearer().await.unwrap(), "ya29.token");
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let provider = TokenProvider::new(reqwest::Client::new(), Some(String::new()));
        assert!(provider.fixed.is_none());
    }

    #[test]
    fn test_parses_metadata_response() {
        let token: MetadataToken = serde_json::from_str(
            r#"{"access_token":"abc","expires_in":3599,"token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 3599);
    }
}
