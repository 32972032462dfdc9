use std::sync::{Arc, RwLock};
use std::time::Instant;

use async_trait::async_trait;
use document::{Document, SearchRequest};
use embedding::EmbeddingModel;
use hashbrown::HashMap;
use tracing::{debug, info};

use crate::descriptor::{BackendDescriptor, SimilarityMetric};
use crate::embed::{check_ids, check_supplied_dimensions, embed_missing, embed_query};
use crate::ranking::rank;
use crate::{VectorStore, VectorStoreError};

/// Identifier reported as `db.system`.
pub const IN_MEMORY_DATABASE_SYSTEM: &str = "simple";

/// Process-local store backed by a `RwLock<HashMap>`.
///
/// Has no collection, namespace or field concepts. Contents are lost on drop.
pub struct InMemoryVectorStore {
    embedding: Arc<dyn EmbeddingModel>,
    metric: SimilarityMetric,
    documents: RwLock<HashMap<String, Document>>,
}

impl InMemoryVectorStore {
    pub fn new(embedding: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            embedding,
            metric: SimilarityMetric::Cosine,
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn len(&self) -> Result<usize, VectorStoreError> {
        let guard = self
            .documents
            .read()
            .map_err(|_| VectorStoreError::backend("poisoned lock"))?;
        Ok(guard.len())
    }

    pub fn is_empty(&self) -> Result<bool, VectorStoreError> {
        Ok(self.len()? == 0)
    }

    /// Stored copy of `id`, including its embedding.
    pub fn get(&self, id: &str) -> Result<Option<Document>, VectorStoreError> {
        let guard = self
            .documents
            .read()
            .map_err(|_| VectorStoreError::backend("poisoned lock"))?;
        Ok(guard.get(id).cloned())
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor::new(IN_MEMORY_DATABASE_SYSTEM, self.metric)
            .with_dimensions(self.embedding.dimensions())
    }

    async fn add(&self, documents: Vec<Document>) -> Result<(), VectorStoreError> {
        check_supplied_dimensions(self.embedding.as_ref(), &documents)?;
        let started = Instant::now();
        let count = documents.len();
        let (documents, usage) = embed_missing(self.embedding.as_ref(), documents).await?;

        // A single write lock is held for the entire batch.
        let mut guard = self
            .documents
            .write()
            .map_err(|_| VectorStoreError::backend("poisoned lock"))?;
        for doc in documents {
            guard.insert(doc.id().to_string(), doc);
        }
        drop(guard);

        info!(
            db_system = IN_MEMORY_DATABASE_SYSTEM,
            documents = count,
            prompt_tokens = usage.prompt_tokens,
            total_tokens = usage.total_tokens,
            elapsed_micros = started.elapsed().as_micros() as u64,
            "vector_store_add_success"
        );
        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<(), VectorStoreError> {
        check_ids(ids)?;
        let mut guard = self
            .documents
            .write()
            .map_err(|_| VectorStoreError::backend("poisoned lock"))?;
        let removed = ids.iter().filter(|id| guard.remove(id.as_str()).is_some()).count();
        drop(guard);

        debug!(
            db_system = IN_MEMORY_DATABASE_SYSTEM,
            requested = ids.len(),
            removed,
            "vector_store_delete_success"
        );
        Ok(())
    }

    async fn similarity_search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<Document>, VectorStoreError> {
        let started = Instant::now();
        let (query, usage) = embed_query(self.embedding.as_ref(), request.query_text()).await?;

        // The read lock is held for the duration of the scan.
        let guard = self
            .documents
            .read()
            .map_err(|_| VectorStoreError::backend("poisoned lock"))?;
        let hits = rank(guard.values(), &query, request, self.metric);
        drop(guard);

        debug!(
            db_system = IN_MEMORY_DATABASE_SYSTEM,
            top_k = request.top_k(),
            hits = hits.len(),
            prompt_tokens = usage.prompt_tokens,
            elapsed_micros = started.elapsed().as_micros() as u64,
            "vector_store_query_success"
        );
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document::FilterExpression;
    use embedding::HashingEmbeddingModel;

    fn store() -> InMemoryVectorStore {
        InMemoryVectorStore::new(Arc::new(HashingEmbeddingModel::default()))
    }

    fn great_depression() -> Document {
        Document::builder("Great Depression caused mass unemployment")
            .id("a")
            .metadata("meta2", "meta2")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn add_then_search_returns_hit() {
        let store = store();
        store.add(vec![great_depression()]).await.unwrap();

        let request = SearchRequest::builder("What is Great Depression")
            .top_k(1)
            .similarity_threshold_all()
            .build()
            .unwrap();
        let hits = store.similarity_search(&request).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "a");
        assert!(hits[0].score().unwrap() > 0.0);
        assert_eq!(hits[0].metadata().get("meta2"), Some(&"meta2".into()));
    }

    #[tokio::test]
    async fn add_upserts_by_id() {
        let store = store();
        store.add(vec![great_depression()]).await.unwrap();
        let replacement = Document::builder("replaced content").id("a").build().unwrap();
        store.add(vec![replacement]).await.unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get("a").unwrap().unwrap().content(), "replaced content");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = store();
        let other = Document::builder("other").id("b").build().unwrap();
        store.add(vec![great_depression(), other]).await.unwrap();

        store.delete(&["missing".to_string()]).await.unwrap();
        assert_eq!(store.len().unwrap(), 2);

        store.delete(&["a".to_string()]).await.unwrap();
        store.delete(&["a".to_string()]).await.unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.get("b").unwrap().is_some());
    }

    #[tokio::test]
    async fn search_on_empty_store_is_empty() {
        let hits = store()
            .similarity_search(&SearchRequest::query("anything"))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_respects_top_k_threshold_and_filter() {
        let store = store();
        let docs = vec![
            Document::builder("red apples and green apples").id("1").metadata("kind", "fruit").build().unwrap(),
            Document::builder("apples grow on trees").id("2").metadata("kind", "fruit").build().unwrap(),
            Document::builder("apples of a tech company").id("3").metadata("kind", "tech").build().unwrap(),
            Document::builder("nothing related").id("4").metadata("kind", "fruit").build().unwrap(),
        ];
        store.add(docs).await.unwrap();

        let request = SearchRequest::builder("apples")
            .top_k(2)
            .similarity_threshold(0.1)
            .filter(FilterExpression::eq("kind", "fruit"))
            .build()
            .unwrap();
        let hits = store.similarity_search(&request).await.unwrap();
        assert!(hits.len() <= 2);
        assert!(!hits.is_empty());
        for hit in &hits {
            assert!(hit.score().unwrap() >= 0.1);
            assert_eq!(hit.metadata().get("kind"), Some(&"fruit".into()));
        }
        for pair in hits.windows(2) {
            assert!(pair[0].score() >= pair[1].score());
        }
    }

    #[tokio::test]
    async fn mismatched_supplied_embedding_is_rejected() {
        let store = store();
        let doc = Document::builder("x").embedding(vec![1.0, 0.0]).build().unwrap();
        let err = store.add(vec![doc]).await.unwrap_err();
        assert!(!err.was_attempted());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn empty_id_delete_is_rejected() {
        let err = store().delete(&[String::new()]).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::InvalidArgument(_)));
    }

    #[test]
    fn descriptor_reports_simple_without_collections() {
        let d = store().descriptor();
        assert_eq!(d.database_system, "simple");
        assert_eq!(d.similarity_metric, SimilarityMetric::Cosine);
        assert!(d.collection_name.is_none());
        assert!(d.namespace.is_none());
        assert!(d.field_name.is_none());
        assert_eq!(d.dimensions, Some(384));
    }
}
