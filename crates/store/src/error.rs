use document::DocumentError;
use embedding::EmbeddingError;
use thiserror::Error;
use usage::UsageError;

/// Errors surfaced by [`VectorStore`](crate::VectorStore) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorStoreError {
    /// Rejected before anything was attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The embedding provider failed to produce vectors.
    #[error("embedding failure: {0}")]
    EmbeddingFailure(String),
    /// The storage engine could not be reached or failed mid-operation.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    /// A provider or the storage engine returned data that could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl VectorStoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::BackendUnavailable(err.to_string())
    }

    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// `false` when the call was rejected up front and no backend or provider
    /// work happened.
    pub fn was_attempted(&self) -> bool {
        !matches!(self, VectorStoreError::InvalidArgument(_))
    }
}

impl From<DocumentError> for VectorStoreError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::InvalidArgument(msg) => VectorStoreError::InvalidArgument(msg),
        }
    }
}

impl From<EmbeddingError> for VectorStoreError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::MalformedResponse(msg) => VectorStoreError::MalformedResponse(msg),
            other => VectorStoreError::EmbeddingFailure(other.to_string()),
        }
    }
}

impl From<UsageError> for VectorStoreError {
    fn from(err: UsageError) -> Self {
        match err {
            UsageError::MalformedResponse(msg) => VectorStoreError::MalformedResponse(msg),
        }
    }
}

impl From<bincode::error::EncodeError> for VectorStoreError {
    fn from(e: bincode::error::EncodeError) -> Self {
        VectorStoreError::BackendUnavailable(format!("encode: {e}"))
    }
}

impl From<bincode::error::DecodeError> for VectorStoreError {
    fn from(e: bincode::error::DecodeError) -> Self {
        VectorStoreError::MalformedResponse(format!("decode: {e}"))
    }
}

impl From<tokio::task::JoinError> for VectorStoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        VectorStoreError::BackendUnavailable(format!("blocking task failed: {e}"))
    }
}
