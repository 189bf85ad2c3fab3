/// Failure reported by a [`Transport`](crate::Transport) for a single attempt.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The attempt did not complete within the per-request timeout.
    #[error("request timed out")]
    Timeout,
    /// The connection to the endpoint could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Any other request execution failure.
    #[error("{0}")]
    Other(String),
}

/// Reason a single attempt did not produce an acceptable response.
///
/// Attempt failures are retried inside the request loop; the last one is
/// carried by [`AtmError::RetriesExhausted`] for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AttemptFailure {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Body was missing, not JSON, or not an object when fields were expected.
    #[error("malformed response: {0}")]
    ResponseFormat(String),
    #[error("response is missing expected fields: {}", .missing.join(", "))]
    IncompleteResponse { missing: Vec<String> },
}

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum AtmError {
    /// A key-gated endpoint was called without an API key. No request was sent.
    #[error("missing API key")]
    MissingApiKey,
    /// Every attempt failed; the request did not succeed.
    #[error("request failed after retries: {last}")]
    RetriesExhausted {
        /// Failure observed on the final attempt.
        last: AttemptFailure,
    },
    /// Registration rejected because an account already exists for the email.
    #[error("{message}")]
    AccountExists {
        /// Email submitted for registration.
        email: String,
        /// Human readable message suitable for end users.
        message: String,
    },
    /// Application level error message returned by the service.
    #[error("api error: {message}")]
    Api { message: String },
    /// Caller supplied input that cannot be encoded into a request.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Accepted response whose fields do not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AtmError {
    /// Returns `true` for the uniform "operation did not succeed" outcome.
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}
