use thiserror::Error;
use usage::UsageError;

/// Errors surfaced by embedding providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbeddingError {
    /// Configuration is inconsistent (e.g., `api` mode without an `api_url`).
    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),
    /// The provider could not be reached or answered with a non-success status.
    #[error("embedding request failed: {0}")]
    Request(String),
    /// The provider answered, but the payload does not have the expected shape.
    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
    /// The provider refused or could not embed the input.
    #[error("embedding failure: {0}")]
    Failure(String),
}

impl From<UsageError> for EmbeddingError {
    fn from(err: UsageError) -> Self {
        match err {
            UsageError::MalformedResponse(msg) => EmbeddingError::MalformedResponse(msg),
        }
    }
}
