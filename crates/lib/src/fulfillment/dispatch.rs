//! Intent dispatch table: exact intent-name lookup to a handler.
//!
//! Built once at startup and shared read-only across requests. Duplicate registration is a
//! configuration error, never an overwrite.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::context::FulfillmentContext;

/// Stateless unit of fulfillment for one intent. Failures are turned into reply text by the
/// handler itself; nothing propagates to the transport.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    async fn handle(&self, ctx: &mut FulfillmentContext);
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("intent {0:?} registered more than once")]
    DuplicateIntent(String),
}

#[derive(Default)]
pub struct DispatchTableBuilder {
    handlers: HashMap<String, Arc<dyn IntentHandler>>,
}

impl DispatchTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        intent: impl Into<String>,
        handler: Arc<dyn IntentHandler>,
    ) -> Result<&mut Self, DispatchError> {
        let intent = intent.into();
        if self.handlers.contains_key(&intent) {
            return Err(DispatchError::DuplicateIntent(intent));
        }
        self.handlers.insert(intent, handler);
        Ok(self)
    }

    pub fn build(self) -> DispatchTable {
        DispatchTable {
            handlers: self.handlers,
        }
    }
}

pub struct DispatchTable {
    handlers: HashMap<String, Arc<dyn IntentHandler>>,
}

impl DispatchTable {
    pub fn builder() -> DispatchTableBuilder {
        DispatchTableBuilder::new()
    }

    /// Exact match only: no case folding, trimming, or prefix matching.
    pub fn resolve(&self, intent: &str) -> Option<Arc<dyn IntentHandler>> {
        self.handlers.get(intent).cloned()
    }

    /// Registered intent names, sorted.
    pub fn intents(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}
