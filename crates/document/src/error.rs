//! Error type produced while constructing documents and search requests.
//!
//! Every check in this crate runs eagerly at construction time, so a value that
//! exists is a value a store may act on. The single variant below therefore
//! means "nothing was attempted": callers can surface it as a client error
//! without worrying about partially applied writes.

use thiserror::Error;

/// Errors surfaced by document, filter, and request construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// A caller-supplied value violates a model invariant (empty id, `top_k == 0`,
    /// threshold outside `[0, 1]`, malformed filter, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DocumentError {
    pub(crate) fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument(message.into())
    }
}
