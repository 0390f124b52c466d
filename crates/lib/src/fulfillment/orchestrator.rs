//! Per-request fulfillment: parse the classified query, run exactly one handler, return its reply.
//!
//! Received → Dispatched → Replied. The only suspension point is inside the dispatched handler.

use std::sync::Arc;

use super::context::FulfillmentContext;
use super::dispatch::DispatchTable;
use super::webhook::{WebhookRequest, WebhookResponse};
use crate::dialogflow::RelayError;

#[derive(Clone)]
pub struct Orchestrator {
    table: Arc<DispatchTable>,
}

impl Orchestrator {
    pub fn new(table: DispatchTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Run the handler for the request's intent and return the accumulated reply.
    /// The only error is `HandlerNotFound`, which means the platform's fallback applies.
    pub async fn fulfill(&self, request: &WebhookRequest) -> Result<String, RelayError> {
        // received
        let Some(mut ctx) = FulfillmentContext::from_request(request) else {
            return Err(RelayError::HandlerNotFound(String::new()));
        };

        // dispatched
        let Some(handler) = self.table.resolve(ctx.intent()) else {
            return Err(RelayError::HandlerNotFound(ctx.intent().to_string()));
        };
        log::debug!(
            "fulfillment: dispatching intent {} (response {})",
            ctx.intent(),
            request.response_id.as_deref().unwrap_or("-")
        );
        handler.handle(&mut ctx).await;

        // replied
        Ok(ctx.into_reply())
    }

    /// Like `fulfill`, but always yields a response body. Unmatched intents get an empty
    /// response so the platform uses its own configured replies.
    pub async fn respond(&self, request: &WebhookRequest) -> WebhookResponse {
        match self.fulfill(request).await {
            Ok(reply) => WebhookResponse::text(reply),
            Err(e) => {
                log::info!("fulfillment: {}, deferring to platform", e);
                WebhookResponse::default()
            }
        }
    }
}
