//! Detect-intent client bound to one counselor session.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::error::{RelayError, RemoteCallError};
use super::token::TokenSource;
use super::types::{
    DetectIntentBody, DetectIntentRequest, DetectIntentResponse, DetectIntentResult, SessionPath,
};

const DEFAULT_BASE_URL: &str = "https://dialogflow.googleapis.com";

/// Remote conversational session the relay forwards to.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// The session this client is bound to. Never changes after construction.
    fn session(&self) -> &SessionPath;

    /// One authenticated round trip. No retry; a failure is reported immediately.
    async fn detect_intent(
        &self,
        request: &DetectIntentRequest,
    ) -> Result<DetectIntentResult, RelayError>;
}

/// Rejects requests the bound client must not send: empty text or a different session.
/// Whitespace-only text is still an utterance and is forwarded.
fn check_request(bound: &SessionPath, request: &DetectIntentRequest) -> Result<(), RelayError> {
    if request.text.is_empty() {
        return Err(RelayError::EmptyUtterance);
    }
    if request.session != *bound {
        return Err(RelayError::SessionMismatch {
            requested: request.session.to_string(),
            bound: bound.to_string(),
        });
    }
    Ok(())
}

/// Client for the Dialogflow ES v2 sessions API.
#[derive(Clone)]
pub struct DialogflowSessionClient {
    base_url: String,
    session: SessionPath,
    tokens: Arc<dyn TokenSource>,
    client: reqwest::Client,
}

impl DialogflowSessionClient {
    pub fn new(
        base_url: Option<String>,
        session: SessionPath,
        tokens: Arc<dyn TokenSource>,
        client: reqwest::Client,
    ) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            session,
            tokens,
            client,
        }
    }

    /// HTTP client shared by the session client and its token source.
    pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder().timeout(timeout).build()
    }

    fn detect_intent_url(&self) -> String {
        format!("{}/v2/{}:detectIntent", self.base_url, self.session)
    }

    /// POST /v2/{session}:detectIntent
    async fn call(
        &self,
        request: &DetectIntentRequest,
    ) -> Result<DetectIntentResult, RemoteCallError> {
        let token = self.tokens.access_token().await?;
        let body = DetectIntentBody::from_request(request);
        let res = self
            .client
            .post(self.detect_intent_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(RemoteCallError::Auth(format!("{} {}", status, body)));
            }
            return Err(RemoteCallError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let data: DetectIntentResponse = res
            .json()
            .await
            .map_err(|e| RemoteCallError::Malformed(e.to_string()))?;
        let query_result = data
            .query_result
            .ok_or_else(|| RemoteCallError::Malformed("missing queryResult".to_string()))?;
        Ok(DetectIntentResult {
            fulfillment_text: query_result.fulfillment_text,
        })
    }
}

#[async_trait]
impl SessionClient for DialogflowSessionClient {
    fn session(&self) -> &SessionPath {
        &self.session
    }

    async fn detect_intent(
        &self,
        request: &DetectIntentRequest,
    ) -> Result<DetectIntentResult, RelayError> {
        check_request(&self.session, request)?;
        Ok(self.call(request).await?)
    }
}
