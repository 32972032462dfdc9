use std::sync::Arc;

use embedding::EmbeddingModel;
use serde::{Deserialize, Serialize};

use crate::config::CompressionConfig;
use crate::descriptor::SimilarityMetric;
use crate::{VectorStore, VectorStoreError};

mod memory;
#[cfg(feature = "backend-redb")]
mod redb;

pub use self::memory::{InMemoryVectorStore, IN_MEMORY_DATABASE_SYSTEM};
#[cfg(feature = "backend-redb")]
pub use self::redb::{RedbVectorStore, DEFAULT_TABLE, REDB_DATABASE_SYSTEM};

fn default_table() -> String {
    "documents".to_string()
}

/// Selects and builds a storage backend.
///
/// # Example
/// ```
/// use store::BackendConfig;
///
/// let config = BackendConfig::in_memory();
/// let config = BackendConfig::redb("/data/vectorscope.redb");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Process-local map; contents are lost on drop.
    #[default]
    InMemory,
    /// redb database file. Requires the `backend-redb` feature (on by default).
    Redb {
        path: String,
        #[serde(default = "default_table")]
        table: String,
        #[serde(default)]
        compression: CompressionConfig,
    },
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb {
            path: path.into(),
            table: default_table(),
            compression: CompressionConfig::default(),
        }
    }

    /// Build the configured backend around `embedding`.
    pub fn build(
        &self,
        embedding: Arc<dyn EmbeddingModel>,
        metric: SimilarityMetric,
    ) -> Result<Arc<dyn VectorStore>, VectorStoreError> {
        match self {
            BackendConfig::InMemory => {
                Ok(Arc::new(InMemoryVectorStore::new(embedding).with_metric(metric)))
            }
            BackendConfig::Redb {
                path,
                table,
                compression,
            } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Arc::new(
                        RedbVectorStore::open(path, table, embedding)?
                            .with_compression(*compression)
                            .with_metric(metric),
                    ))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = (path, table, compression, embedding);
                    Err(VectorStoreError::backend(
                        "redb backend disabled at compile time",
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedding::HashingEmbeddingModel;

    #[test]
    fn deserializes_tagged_variants() {
        let cfg: BackendConfig = serde_json::from_str(r#"{"backend":"in_memory"}"#).unwrap();
        assert_eq!(cfg, BackendConfig::InMemory);

        let cfg: BackendConfig =
            serde_json::from_str(r#"{"backend":"redb","path":"/tmp/x.redb"}"#).unwrap();
        assert_eq!(cfg, BackendConfig::redb("/tmp/x.redb"));
    }

    #[test]
    fn builds_in_memory() {
        let store = BackendConfig::in_memory()
            .build(
                Arc::new(HashingEmbeddingModel::default()),
                SimilarityMetric::Cosine,
            )
            .unwrap();
        assert_eq!(store.descriptor().database_system, "simple");
    }

    #[cfg(feature = "backend-redb")]
    #[test]
    fn builds_redb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.redb");
        let store = BackendConfig::redb(path.to_string_lossy())
            .build(
                Arc::new(HashingEmbeddingModel::default()),
                SimilarityMetric::DotProduct,
            )
            .unwrap();
        let d = store.descriptor();
        assert_eq!(d.database_system, "redb");
        assert_eq!(d.similarity_metric, SimilarityMetric::DotProduct);
        assert_eq!(d.collection_name.as_deref(), Some("documents"));
    }
}
