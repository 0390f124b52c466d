//! Webhook authentication: bearer token sent by the platform as a custom header.

use secrecy::{ExposeSecret, SecretString};

/// Validate a provided bearer token against the configured webhook token.
pub fn validate_token(configured_token: &SecretString, provided_token: &str) -> bool {
    if provided_token.is_empty() {
        log::warn!("webhook auth: no token provided");
        return false;
    }
    constant_time_eq(
        configured_token.expose_secret().as_bytes(),
        provided_token.as_bytes(),
    )
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    let token = header_value.trim().strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
