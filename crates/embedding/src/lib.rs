//! Embedding providers for vectorscope stores.
//!
//! A store turns document content and query text into vectors through an
//! [`EmbeddingModel`]. Two providers ship here:
//!
//! - [`HashingEmbeddingModel`] - deterministic feature hashing, no network,
//!   good for tests and offline demos.
//! - [`ApiEmbeddingModel`] - any OpenAI-compatible `/embeddings` endpoint; the
//!   provider's `usage` block is normalized through [`usage::normalize_value`].
//!
//! ```
//! use embedding::{build_model, EmbeddingConfig};
//!
//! let model = build_model(&EmbeddingConfig::default()).unwrap();
//! assert_eq!(model.dimensions(), Some(384));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use usage::Usage;

mod api;
mod config;
mod error;
mod hashing;
mod normalize;

pub use crate::api::ApiEmbeddingModel;
pub use crate::config::{EmbeddingConfig, EmbeddingMode, DEFAULT_HASHING_DIMENSIONS};
pub use crate::error::EmbeddingError;
pub use crate::hashing::HashingEmbeddingModel;

/// Vectors for a batch of inputs, in input order, plus what the provider billed.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingResponse {
    pub vectors: Vec<Vec<f32>>,
    pub usage: Usage,
}

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Vector length, when known. Remote models may only learn it from their
    /// first response.
    fn dimensions(&self) -> Option<usize>;

    async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingResponse, EmbeddingError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self.embed_batch(&[text.to_string()]).await?;
        response.vectors.into_iter().next().ok_or_else(|| {
            EmbeddingError::MalformedResponse("provider returned no embedding".into())
        })
    }
}

/// Build the provider selected by `cfg.mode`.
pub fn build_model(cfg: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingModel>, EmbeddingError> {
    match cfg.mode {
        EmbeddingMode::Hashing => Ok(Arc::new(HashingEmbeddingModel::from_config(cfg)?)),
        EmbeddingMode::Api => Ok(Arc::new(ApiEmbeddingModel::from_config(cfg)?)),
    }
}
