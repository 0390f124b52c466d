//! `SendMessageToCounselor`: forward the client's utterance to the counselor session.
//!
//! The client only ever sees a fixed acknowledgment or a fixed apology. The counselor's own
//! reply and any failure cause go to the log.

use async_trait::async_trait;
use std::sync::Arc;

use super::context::FulfillmentContext;
use super::dispatch::IntentHandler;
use crate::config::{CounselorConfig, RelayConfig};
use crate::dialogflow::{
    DetectIntentRequest, DetectIntentResult, RelayError, SessionClient, DEFAULT_LANGUAGE_CODE,
};

pub const SEND_MESSAGE_TO_COUNSELOR: &str = "SendMessageToCounselor";
pub const HANDLE_CLIENT_MESSAGE: &str = "HandleClientMessage";
pub const ACK_MESSAGE: &str = "상담사에게 메시지를 전달했습니다.";
pub const FAILURE_MESSAGE: &str = "Counselor에게 메시지를 전달하는 데 실패했습니다.";

pub struct RelayHandler {
    client: Arc<dyn SessionClient>,
    target_intent: String,
    language_code: String,
    ack_message: String,
    failure_message: String,
}

impl RelayHandler {
    pub fn new(client: Arc<dyn SessionClient>) -> Self {
        Self {
            client,
            target_intent: HANDLE_CLIENT_MESSAGE.to_string(),
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            ack_message: ACK_MESSAGE.to_string(),
            failure_message: FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn from_config(
        client: Arc<dyn SessionClient>,
        counselor: &CounselorConfig,
        relay: &RelayConfig,
    ) -> Self {
        Self {
            client,
            target_intent: counselor.intent.clone(),
            language_code: counselor.language_code.clone(),
            ack_message: relay.ack_message.clone(),
            failure_message: relay.failure_message.clone(),
        }
    }

    /// One detect-intent call against the bound session, forcing the target intent.
    pub async fn forward(&self, text: &str) -> Result<DetectIntentResult, RelayError> {
        let request = DetectIntentRequest::new(self.client.session().clone(), text)
            .with_language_code(self.language_code.as_str())
            .with_forced_intent(self.target_intent.as_str());
        self.client.detect_intent(&request).await
    }
}

#[async_trait]
impl IntentHandler for RelayHandler {
    async fn handle(&self, ctx: &mut FulfillmentContext) {
        let outcome = self.forward(ctx.query_text()).await;
        match outcome {
            Ok(result) => {
                log::info!("relay: message from client forwarded to counselor: {}", ctx.query_text());
                log::info!("relay: counselor response: {}", result.fulfillment_text);
                ctx.add(self.ack_message.as_str());
            }
            Err(e) => {
                log::warn!("relay: failed to forward client message: {}", e);
                ctx.add(self.failure_message.as_str());
            }
        }
    }
}
