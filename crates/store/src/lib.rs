//! Vector store interface, storage backends and the observed wrapper.
//!
//! Every backend implements [`VectorStore`]: `add` embeds documents that
//! carry no embedding and upserts them by id, `delete` removes ids
//! (absent ids are ignored), and `similarity_search` embeds the query text
//! and returns the best `top_k` hits at or above the request threshold.
//!
//! [`ObservedVectorStore`] decorates any store so every call is reported
//! through an [`observation::ObservationRegistry`]:
//!
//! ```
//! use std::sync::Arc;
//! use document::{Document, SearchRequest};
//! use embedding::HashingEmbeddingModel;
//! use observation::{ObservationRegistry, RecordingObservationHandler};
//! use store::{InMemoryVectorStore, ObservedVectorStore, VectorStore};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let recorder = Arc::new(RecordingObservationHandler::new());
//! let registry = ObservationRegistry::new().with_handler(recorder.clone());
//! let inner = InMemoryVectorStore::new(Arc::new(HashingEmbeddingModel::default()));
//! let store = ObservedVectorStore::new(inner, registry);
//!
//! store.add(vec![Document::new("Great Depression")]).await.unwrap();
//! let hits = store
//!     .similarity_search(&SearchRequest::query("depression"))
//!     .await
//!     .unwrap();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(recorder.stop_count(), 2);
//! # });
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use document::{Document, SearchRequest};

mod backend;
#[cfg(feature = "backend-redb")]
mod codec;
mod config;
mod descriptor;
mod embed;
mod error;
mod observed;
pub mod ranking;

pub use crate::backend::{BackendConfig, InMemoryVectorStore, IN_MEMORY_DATABASE_SYSTEM};
#[cfg(feature = "backend-redb")]
pub use crate::backend::{RedbVectorStore, DEFAULT_TABLE, REDB_DATABASE_SYSTEM};
pub use crate::config::{CompressionCodec, CompressionConfig};
pub use crate::descriptor::{BackendDescriptor, SimilarityMetric};
pub use crate::error::VectorStoreError;
pub use crate::observed::ObservedVectorStore;

/// A store of embedded documents searchable by similarity.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Static facts about the backend: database system, metric, collection
    /// naming and dimensionality when known.
    fn descriptor(&self) -> BackendDescriptor;

    /// Embed documents lacking an embedding and upsert all of them by id.
    async fn add(&self, documents: Vec<Document>) -> Result<(), VectorStoreError>;

    /// Remove the given ids. Unknown ids are not an error.
    async fn delete(&self, ids: &[String]) -> Result<(), VectorStoreError>;

    /// Best matches for `request`, highest score first, each carrying its score.
    async fn similarity_search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<Document>, VectorStoreError>;

    /// Search with default `top_k`, no threshold and no filter.
    async fn similarity_search_query(
        &self,
        query: &str,
    ) -> Result<Vec<Document>, VectorStoreError> {
        self.similarity_search(&SearchRequest::query(query)).await
    }
}

#[async_trait]
impl<S: VectorStore + ?Sized> VectorStore for Arc<S> {
    fn descriptor(&self) -> BackendDescriptor {
        (**self).descriptor()
    }

    async fn add(&self, documents: Vec<Document>) -> Result<(), VectorStoreError> {
        (**self).add(documents).await
    }

    async fn delete(&self, ids: &[String]) -> Result<(), VectorStoreError> {
        (**self).delete(ids).await
    }

    async fn similarity_search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<Document>, VectorStoreError> {
        (**self).similarity_search(request).await
    }
}
