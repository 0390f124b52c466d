//! Webhook fulfillment: intent dispatch, the per-request orchestrator, and the relay handler.

mod context;
mod dispatch;
mod orchestrator;
mod relay;
mod webhook;

use std::sync::Arc;

pub use context::FulfillmentContext;
pub use dispatch::{DispatchError, DispatchTable, DispatchTableBuilder, IntentHandler};
pub use orchestrator::Orchestrator;
pub use relay::{
    RelayHandler, ACK_MESSAGE, FAILURE_MESSAGE, HANDLE_CLIENT_MESSAGE, SEND_MESSAGE_TO_COUNSELOR,
};
pub use webhook::{
    FulfillmentMessage, IntentRef, MessageText, WebhookQueryResult, WebhookRequest,
    WebhookResponse,
};

use crate::config::Config;
use crate::dialogflow::SessionClient;

/// The relay's dispatch table: `SendMessageToCounselor` → relay to the counselor session.
pub fn build_dispatch_table(
    config: &Config,
    client: Arc<dyn SessionClient>,
) -> Result<DispatchTable, DispatchError> {
    let relay = RelayHandler::from_config(client, &config.counselor, &config.relay);
    let mut builder = DispatchTable::builder();
    builder.register(SEND_MESSAGE_TO_COUNSELOR, Arc::new(relay))?;
    Ok(builder.build())
}
