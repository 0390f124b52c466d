//! Detect-intent request/result and their wire shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_LANGUAGE_CODE: &str = "ko";

/// Address of one durable remote session: `projects/{project}/agent/sessions/{session}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionPath {
    project_id: String,
    session_id: String,
}

impl SessionPath {
    pub fn new(project_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            session_id: session_id.into(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Full resource name of an intent on the same agent.
    pub fn intent_path(&self, intent: &str) -> String {
        format!("projects/{}/agent/intents/{}", self.project_id, intent)
    }
}

impl fmt::Display for SessionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/agent/sessions/{}",
            self.project_id, self.session_id
        )
    }
}

/// One detect-intent call. Built fresh per relay; nothing about it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectIntentRequest {
    pub session: SessionPath,
    pub text: String,
    pub language_code: String,
    /// Intent display name the remote agent should treat `text` as, instead of classifying it.
    pub forced_intent: Option<String>,
}

impl DetectIntentRequest {
    pub fn new(session: SessionPath, text: impl Into<String>) -> Self {
        Self {
            session,
            text: text.into(),
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            forced_intent: None,
        }
    }

    pub fn with_language_code(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = language_code.into();
        self
    }

    pub fn with_forced_intent(mut self, intent: impl Into<String>) -> Self {
        self.forced_intent = Some(intent.into());
        self
    }
}

/// Successful detect-intent outcome. An empty fulfillment text is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectIntentResult {
    pub fulfillment_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DetectIntentBody {
    pub query_input: QueryInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_params: Option<QueryParams>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryInput {
    pub text: TextInput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TextInput {
    pub text: String,
    pub language_code: String,
}

/// The forced intent travels in `queryParams.payload`, which the counselor agent's own
/// fulfillment receives untouched.
#[derive(Debug, Serialize)]
pub(crate) struct QueryParams {
    pub payload: serde_json::Value,
}

impl DetectIntentBody {
    pub fn from_request(request: &DetectIntentRequest) -> Self {
        let query_params = request.forced_intent.as_deref().map(|intent| QueryParams {
            payload: serde_json::json!({
                "forcedIntent": request.session.intent_path(intent),
            }),
        });
        Self {
            query_input: QueryInput {
                text: TextInput {
                    text: request.text.clone(),
                    language_code: request.language_code.clone(),
                },
            },
            query_params,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DetectIntentResponse {
    #[serde(default)]
    pub query_result: Option<QueryResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryResult {
    #[serde(default)]
    pub fulfillment_text: String,
}
