/// Why an outbound call to the counselor session did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum RemoteCallError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("api error: {status} {body}")]
    Api { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The authenticated call to the counselor session failed. Never retried.
    #[error("remote call failed: {0}")]
    RemoteCallFailed(#[from] RemoteCallError),
    /// No handler is registered for the classified intent; the platform's fallback applies.
    #[error("no handler registered for intent {0:?}")]
    HandlerNotFound(String),
    #[error("utterance text is empty")]
    EmptyUtterance,
    #[error("request addressed to {requested}, client is bound to {bound}")]
    SessionMismatch { requested: String, bound: String },
}
