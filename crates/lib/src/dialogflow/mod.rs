//! Counselor session client over the Dialogflow ES v2 REST API.
//!
//! One client is bound to one fixed session and one credential for the lifetime of the process.
//! The only capability exposed is detect-intent, optionally forcing the intent the remote side
//! should treat the utterance as.

mod client;
mod error;
mod token;
mod types;

pub use client::{DialogflowSessionClient, SessionClient};
pub use error::{RelayError, RemoteCallError};
pub use token::{ServiceAccountTokenSource, StaticTokenSource, TokenSource, CLOUD_PLATFORM_SCOPE};
pub use types::{DetectIntentRequest, DetectIntentResult, SessionPath, DEFAULT_LANGUAGE_CODE};
