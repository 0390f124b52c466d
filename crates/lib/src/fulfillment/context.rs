//! Per-request fulfillment context: the classified query in, the reply accumulator out.

use super::webhook::WebhookRequest;

#[derive(Debug, Clone, Default)]
pub struct FulfillmentContext {
    intent: String,
    query_text: String,
    reply: Vec<String>,
}

impl FulfillmentContext {
    pub fn new(intent: impl Into<String>, query_text: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            query_text: query_text.into(),
            reply: Vec::new(),
        }
    }

    /// None when the platform did not report a matched intent.
    pub fn from_request(request: &WebhookRequest) -> Option<Self> {
        let intent = request.intent_name()?;
        Some(Self::new(intent, request.query_text()))
    }

    pub fn intent(&self) -> &str {
        &self.intent
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    /// Append a line to the reply.
    pub fn add(&mut self, text: impl Into<String>) {
        self.reply.push(text.into());
    }

    /// Consume the context and return the accumulated reply.
    pub fn into_reply(self) -> String {
        self.reply.join("\n")
    }
}
