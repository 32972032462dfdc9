use std::fmt;

use serde::{Deserialize, Serialize};

/// How a backend scores candidates against the query vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    /// Raw dot product; equals cosine for unit-length vectors.
    DotProduct,
}

impl SimilarityMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::DotProduct => "dot_product",
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static facts about a backend, reported to telemetry.
///
/// `collection_name`, `namespace` and `field_name` are `None` for engines
/// without that concept. `dimensions` is `None` until the embedding model
/// knows its vector length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    pub database_system: String,
    pub similarity_metric: SimilarityMetric,
    pub collection_name: Option<String>,
    pub namespace: Option<String>,
    pub field_name: Option<String>,
    pub dimensions: Option<usize>,
}

impl BackendDescriptor {
    pub fn new(database_system: impl Into<String>, similarity_metric: SimilarityMetric) -> Self {
        Self {
            database_system: database_system.into(),
            similarity_metric,
            collection_name: None,
            namespace: None,
            field_name: None,
            dimensions: None,
        }
    }

    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    pub fn with_dimensions(mut self, dimensions: Option<usize>) -> Self {
        self.dimensions = dimensions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names() {
        assert_eq!(SimilarityMetric::Cosine.as_str(), "cosine");
        assert_eq!(SimilarityMetric::DotProduct.to_string(), "dot_product");
        let parsed: SimilarityMetric = serde_json::from_str("\"dot_product\"").unwrap();
        assert_eq!(parsed, SimilarityMetric::DotProduct);
    }

    #[test]
    fn builder_sets_optional_concepts() {
        let d = BackendDescriptor::new("redb", SimilarityMetric::Cosine)
            .with_collection_name("documents")
            .with_field_name("embedding")
            .with_dimensions(Some(384));
        assert_eq!(d.collection_name.as_deref(), Some("documents"));
        assert_eq!(d.namespace, None);
        assert_eq!(d.field_name.as_deref(), Some("embedding"));
        assert_eq!(d.dimensions, Some(384));
    }
}
