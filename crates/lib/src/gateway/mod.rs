//! Gateway: HTTP endpoint the client agent's platform calls for fulfillment.
//!
//! Single port serves the webhook route and a health probe on `/`.

mod auth;
mod server;

pub use server::{counselor_client, router, run_gateway, serve_gateway, GatewayState};
