use async_trait::async_trait;
use fxhash::hash64;
use usage::Usage;

use crate::config::DEFAULT_HASHING_DIMENSIONS;
use crate::normalize::l2_normalize_in_place;
use crate::{EmbeddingConfig, EmbeddingError, EmbeddingModel, EmbeddingResponse};

/// Deterministic bag-of-words embedding.
///
/// Each lower-cased alphanumeric token is hashed into one of `dimensions`
/// buckets and counted. Components are never negative, so the cosine
/// similarity of two hashing embeddings always falls in `[0, 1]`. Texts that
/// share words score higher; no model assets or network are needed.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingModel {
    model_name: String,
    dimensions: usize,
    normalize: bool,
}

impl HashingEmbeddingModel {
    pub fn new(dimensions: usize) -> Self {
        Self {
            model_name: "hashing-bow".into(),
            dimensions: dimensions.max(1),
            normalize: true,
        }
    }

    pub fn from_config(cfg: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        cfg.validate()?;
        Ok(Self {
            model_name: cfg.model_name.clone(),
            dimensions: cfg.dimensions.unwrap_or(DEFAULT_HASHING_DIMENSIONS),
            normalize: cfg.normalize,
        })
    }

    /// Embed one text; returns the vector and the number of tokens it counted.
    pub fn embed_text(&self, text: &str) -> (Vec<f32>, u64) {
        let mut v = vec![0f32; self.dimensions];
        let mut tokens = 0u64;
        for token in tokenize(text) {
            let bucket = (hash64(token.as_bytes()) % self.dimensions as u64) as usize;
            v[bucket] += 1.0;
            tokens += 1;
        }
        if self.normalize {
            l2_normalize_in_place(&mut v);
        }
        (v, tokens)
    }
}

impl Default for HashingEmbeddingModel {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSIONS)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl EmbeddingModel for HashingEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingResponse, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        let mut prompt_tokens = 0u64;
        for text in texts {
            let (vector, tokens) = self.embed_text(text);
            vectors.push(vector);
            prompt_tokens += tokens;
        }
        Ok(EmbeddingResponse {
            vectors,
            usage: Usage::new(prompt_tokens, 0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn deterministic_for_same_text() {
        let model = HashingEmbeddingModel::default();
        let (a, _) = model.embed_text("Great Depression");
        let (b, _) = model.embed_text("Great Depression");
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_HASHING_DIMENSIONS);
    }

    #[test]
    fn case_and_punctuation_are_ignored() {
        let model = HashingEmbeddingModel::default();
        let (a, _) = model.embed_text("great depression");
        let (b, _) = model.embed_text("Great, DEPRESSION!");
        assert_eq!(a, b);
    }

    #[test]
    fn shared_words_score_higher() {
        let model = HashingEmbeddingModel::default();
        let (doc, _) = model.embed_text("Great Depression caused mass unemployment");
        let (query, _) = model.embed_text("What is Great Depression");
        let (other, _) = model.embed_text("Photosynthesis in green plants");
        let related = cosine(&doc, &query);
        assert!(related > 0.0);
        assert!(related > cosine(&doc, &other));
    }

    #[test]
    fn components_are_non_negative_and_unit_length() {
        let model = HashingEmbeddingModel::new(64);
        let (v, tokens) = model.embed_text("one two three four five six seven");
        assert_eq!(tokens, 7);
        assert!(v.iter().all(|&x| x >= 0.0));
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let model = HashingEmbeddingModel::new(16);
        let (v, tokens) = model.embed_text("  ... ");
        assert_eq!(tokens, 0);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn from_config_uses_configured_dimensions() {
        let cfg = EmbeddingConfig {
            model_name: "bow-32".into(),
            dimensions: Some(32),
            normalize: false,
            ..Default::default()
        };
        let model = HashingEmbeddingModel::from_config(&cfg).unwrap();
        assert_eq!(model.dimensions(), Some(32));
        assert_eq!(model.model_name(), "bow-32");
        let (v, _) = model.embed_text("a a");
        assert_eq!(v.iter().sum::<f32>(), 2.0);
    }

    #[tokio::test]
    async fn batch_reports_token_usage() {
        let model = HashingEmbeddingModel::new(32);
        let response = model
            .embed_batch(&["hello world".to_string(), "foo".to_string()])
            .await
            .unwrap();
        assert_eq!(response.vectors.len(), 2);
        assert_eq!(response.usage.prompt_tokens, 3);
        assert_eq!(response.usage.total_tokens, 3);
        assert_eq!(response.usage.generation_tokens, 0);
    }
}
