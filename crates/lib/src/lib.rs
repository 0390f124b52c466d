//! Counselor relay library: webhook fulfillment and intent dispatch, plus the authenticated
//! session client that forwards client messages to the counselor agent.

pub mod config;
pub mod credential;
pub mod dialogflow;
pub mod fulfillment;
pub mod gateway;
