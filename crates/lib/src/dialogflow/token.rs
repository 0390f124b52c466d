//! Access tokens for the counselor session client.
//!
//! `ServiceAccountTokenSource` trades a signed assertion for a bearer token at the credential's
//! token uri and reuses it until shortly before it expires.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::error::RemoteCallError;
use crate::credential::AgentCredential;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Refresh this many seconds before the reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, RemoteCallError>;
}

/// Fixed token, e.g. for a local emulator that does not check auth.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String, RemoteCallError> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

struct CachedToken {
    token: String,
    expires_at: i64,
}

pub struct ServiceAccountTokenSource {
    credential: AgentCredential,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(credential: AgentCredential, client: reqwest::Client) -> Self {
        Self {
            credential,
            client,
            cached: Mutex::new(None),
        }
    }

    /// Any failure here, including an unreachable token endpoint, is an `Auth` failure.
    async fn exchange(&self, now: i64) -> Result<CachedToken, RemoteCallError> {
        let assertion = self
            .credential
            .sign_assertion(CLOUD_PLATFORM_SCOPE, now)
            .map_err(|e| RemoteCallError::Auth(e.to_string()))?;
        let res = self
            .client
            .post(self.credential.token_uri())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| RemoteCallError::Auth(format!("token endpoint: {}", e)))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(RemoteCallError::Auth(format!("token endpoint: {} {}", status, body)));
        }
        let data: TokenResponse = res
            .json()
            .await
            .map_err(|e| RemoteCallError::Auth(format!("token response: {}", e)))?;
        log::debug!(
            "counselor token issued for {} (expires in {}s)",
            self.credential.client_email(),
            data.expires_in
        );
        Ok(CachedToken {
            token: data.access_token,
            expires_at: now + data.expires_in,
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String, RemoteCallError> {
        let now = chrono::Utc::now().timestamp();
        let mut cached = self.cached.lock().await;
        if let Some(ref c) = *cached {
            if c.expires_at - EXPIRY_MARGIN_SECS > now {
                return Ok(c.token.clone());
            }
        }
        let fresh = self.exchange(now).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}
