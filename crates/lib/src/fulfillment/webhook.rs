//! Webhook fulfillment wire types (Dialogflow ES v2 `WebhookRequest` / `WebhookResponse`).
//! Only the fields the relay reads or writes are modelled; the rest is ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[serde(default)]
    pub response_id: Option<String>,
    /// Session on the client agent that produced this request.
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub query_result: WebhookQueryResult,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookQueryResult {
    #[serde(default)]
    pub query_text: String,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub intent: Option<IntentRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRef {
    /// Resource name, e.g. `projects/p/agent/intents/<uuid>`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: String,
}

impl WebhookRequest {
    /// Display name of the matched intent, if the platform sent one.
    pub fn intent_name(&self) -> Option<&str> {
        self.query_result
            .intent
            .as_ref()
            .map(|i| i.display_name.as_str())
    }

    pub fn query_text(&self) -> &str {
        &self.query_result.query_text
    }
}

/// Response body. An empty response (`{}`) lets the platform fall back to its own static responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfillment_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fulfillment_messages: Vec<FulfillmentMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentMessage {
    pub text: MessageText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageText {
    pub text: Vec<String>,
}

impl WebhookResponse {
    /// Single text reply, written both as `fulfillmentText` and as one text message.
    pub fn text(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        if reply.is_empty() {
            return Self::default();
        }
        Self {
            fulfillment_messages: vec![FulfillmentMessage {
                text: MessageText {
                    text: vec![reply.clone()],
                },
            }],
            fulfillment_text: Some(reply),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fulfillment_text.is_none() && self.fulfillment_messages.is_empty()
    }
}
