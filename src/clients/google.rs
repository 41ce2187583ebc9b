use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    /// Stable Google account id (`sub`).
    pub subject: String,
    pub email: String,
    pub name: String,
    pub email_verified: bool,
}

#[async_trait]
pub trait GoogleVerifier: Send + Sync {
    /// Verifies an ID token and returns the identity it asserts.
    async fn verify_id_token(&self, id_token: &str) -> Result<GoogleIdentity>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: String,
    aud: String,
    email: Option<String>,
    /// Google sends this as the string "true"/"false".
    email_verified: Option<serde_json::Value>,
    name: Option<String>,
}

impl TokenInfo {
    fn email_verified(&self) -> bool {
        match &self.email_verified {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        }
    }
}

/// Verifies tokens with Google's `tokeninfo` endpoint.
pub struct GoogleTokenInfoClient {
    client: Client,
    endpoint: String,
    client_id: String,
}

impl GoogleTokenInfoClient {
    pub const DEFAULT_ENDPOINT: &'static str = "https://oauth2.googleapis.com/tokeninfo";

    #[must_use]
    pub fn new(endpoint: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("Cinevault/1.0")
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            endpoint: endpoint.into(),
            client_id: client_id.into(),
        }
    }
}

#[async_trait]
impl GoogleVerifier for GoogleTokenInfoClient {
    async fn verify_id_token(&self, id_token: &str) -> Result<GoogleIdentity> {
        if self.client_id.is_empty() {
            bail!("Google sign-in is not configured");
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .context("Failed to reach Google token endpoint")?;

        if !response.status().is_success() {
            bail!("Google rejected the ID token ({})", response.status());
        }

        let info: TokenInfo = response
            .json()
            .await
            .context("Failed to parse Google token info")?;

        if info.aud != self.client_id {
            bail!("ID token was issued for a different client");
        }

        let email_verified = info.email_verified();
        let email = info
            .email
            .filter(|e| !e.is_empty())
            .context("ID token carries no email")?;

        debug!(subject = %info.sub, "Verified Google ID token");

        Ok(GoogleIdentity {
            name: info.name.unwrap_or_else(|| email.clone()),
            subject: info.sub,
            email,
            email_verified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_verified_accepts_string_and_bool() {
        let info: TokenInfo = serde_json::from_str(
            r#"{"sub":"1","aud":"x","email":"a@b.c","email_verified":"true"}"#,
        )
        .unwrap();
        assert!(info.email_verified());

        let info: TokenInfo =
            serde_json::from_str(r#"{"sub":"1","aud":"x","email_verified":false}"#).unwrap();
        assert!(!info.email_verified());
    }
}
