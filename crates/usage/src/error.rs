use thiserror::Error;

/// Errors surfaced while reading a provider usage payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// The payload does not have the expected shape (not an object, negative or
    /// fractional counters, nested details that are not objects, ...).
    #[error("malformed usage payload: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_payload() {
        let err = UsageError::MalformedResponse("expected object".into());
        assert_eq!(err.to_string(), "malformed usage payload: expected object");
    }
}
