use serde::{Deserialize, Serialize};

use crate::EmbeddingError;

/// Dimension used by the hashing model when none is configured.
pub const DEFAULT_HASHING_DIMENSIONS: usize = 384;

/// Which provider backs the store's embeddings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Deterministic feature hashing, no network.
    #[default]
    Hashing,
    /// OpenAI-compatible `/embeddings` endpoint.
    Api,
}

/// Runtime configuration for [`build_model`](crate::build_model).
///
/// # Example
/// ```
/// use embedding::{EmbeddingConfig, EmbeddingMode};
///
/// let cfg = EmbeddingConfig {
///     mode: EmbeddingMode::Api,
///     model_name: "text-embedding-3-small".into(),
///     dimensions: None,
///     api_url: Some("https://api.openai.com/v1/embeddings".into()),
///     api_auth_header: Some("Bearer sk-xxx".into()),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    /// Model label sent to the API and surfaced in logs.
    pub model_name: String,
    /// Vector length. Required-ish for hashing (defaults to 384); for the API
    /// model it is learned from the first response when left empty.
    pub dimensions: Option<usize>,
    /// Endpoint when [`mode`](Self::mode) is `api`.
    pub api_url: Option<String>,
    /// Full `Authorization` header value (e.g., `"Bearer sk-xxx"`).
    pub api_auth_header: Option<String>,
    /// Per-request timeout in seconds.
    pub api_timeout_secs: u64,
    /// Normalize vectors to unit length.
    pub normalize: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Hashing,
            model_name: "hashing-bow".into(),
            dimensions: Some(DEFAULT_HASHING_DIMENSIONS),
            api_url: None,
            api_auth_header: None,
            api_timeout_secs: 30,
            normalize: true,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.model_name.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig(
                "model_name must not be empty".into(),
            ));
        }
        if self.dimensions == Some(0) {
            return Err(EmbeddingError::InvalidConfig(
                "dimensions must be greater than 0".into(),
            ));
        }
        if self.api_timeout_secs == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "api_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.mode == EmbeddingMode::Api
            && self.api_url.as_deref().is_none_or(|url| url.trim().is_empty())
        {
            return Err(EmbeddingError::InvalidConfig(
                "api_url is required for api mode".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_hashing() {
        let cfg = EmbeddingConfig::default();
        assert_eq!(cfg.mode, EmbeddingMode::Hashing);
        assert_eq!(cfg.dimensions, Some(DEFAULT_HASHING_DIMENSIONS));
        assert!(cfg.normalize);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn api_mode_requires_url() {
        let cfg = EmbeddingConfig {
            mode: EmbeddingMode::Api,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("api_url"));

        let cfg = EmbeddingConfig {
            mode: EmbeddingMode::Api,
            api_url: Some("   ".into()),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_dimensions_rejected() {
        let cfg = EmbeddingConfig {
            dimensions: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(EmbeddingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_timeout_rejected() {
        let cfg = EmbeddingConfig {
            api_timeout_secs: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: EmbeddingConfig =
            serde_json::from_str(r#"{"mode":"api","api_url":"http://localhost:8080/v1/embeddings"}"#)
                .expect("config json");
        assert_eq!(cfg.mode, EmbeddingMode::Api);
        assert_eq!(cfg.api_timeout_secs, 30);
        assert_eq!(cfg.model_name, "hashing-bow");
    }
}
