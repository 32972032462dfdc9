//! Instrumented wrapper that observes every call to an inner store.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use document::{Document, SearchRequest};
use observation::{
    DefaultVectorStoreObservationConvention, ObservationRegistry, VectorStoreObservationContext,
    VectorStoreObservationConvention, VectorStoreOperation,
};
use tracing::{info_span, Instrument};

use crate::descriptor::BackendDescriptor;
use crate::embed::{check_embedding_lengths, check_ids};
use crate::{VectorStore, VectorStoreError};

/// Decorates a [`VectorStore`] so each call opens exactly one observation.
///
/// Per call: build the context from the inner descriptor and the arguments,
/// start the observation, run the inner call inside the observation's
/// task-local scope and a `tracing` span, merge result fields into the
/// context, then stop it as success or failure. The inner error is returned
/// unchanged. Arguments rejected up front (empty delete ids, supplied
/// embeddings of the wrong length) return `InvalidArgument` without opening
/// an observation.
pub struct ObservedVectorStore<S> {
    inner: S,
    registry: ObservationRegistry,
    convention: Arc<dyn VectorStoreObservationConvention>,
}

impl<S: VectorStore> ObservedVectorStore<S> {
    pub fn new(inner: S, registry: ObservationRegistry) -> Self {
        Self {
            inner,
            registry,
            convention: Arc::new(DefaultVectorStoreObservationConvention),
        }
    }

    pub fn with_convention(mut self, convention: Arc<dyn VectorStoreObservationConvention>) -> Self {
        self.convention = convention;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn registry(&self) -> &ObservationRegistry {
        &self.registry
    }

    fn context(&self, operation: VectorStoreOperation) -> VectorStoreObservationContext {
        let descriptor = self.inner.descriptor();
        VectorStoreObservationContext::new(
            operation,
            descriptor.database_system,
            descriptor.similarity_metric.as_str(),
        )
        .with_collection_name(descriptor.collection_name)
        .with_namespace(descriptor.namespace)
        .with_field_name(descriptor.field_name)
        .with_dimensions(descriptor.dimensions)
    }

    async fn observe<T, F, M>(
        &self,
        context: VectorStoreObservationContext,
        call: F,
        merge: M,
    ) -> Result<T, VectorStoreError>
    where
        F: Future<Output = Result<T, VectorStoreError>> + Send,
        M: FnOnce(&mut VectorStoreObservationContext, &T) + Send,
        T: Send,
    {
        let mut observation = self.registry.start(context, Arc::clone(&self.convention));
        let span = info_span!(
            "vector_store_operation",
            observation_id = observation.id(),
            db.system = %observation.context().database_system,
            db.operation.name = observation.context().operation.as_str(),
        );

        // Dropping this future mid-call drops `observation`, which records a cancellation.
        let result = observation.scope(call).instrument(span).await;

        // Models may only learn their dimensionality during the call.
        if let Some(dimensions) = self.inner.descriptor().dimensions {
            observation.context_mut().dimensions = Some(dimensions);
        }

        match result {
            Ok(value) => {
                merge(observation.context_mut(), &value);
                observation.stop();
                Ok(value)
            }
            Err(err) => {
                observation.fail(&err);
                Err(err)
            }
        }
    }
}

#[async_trait]
impl<S: VectorStore> VectorStore for ObservedVectorStore<S> {
    fn descriptor(&self) -> BackendDescriptor {
        self.inner.descriptor()
    }

    async fn add(&self, documents: Vec<Document>) -> Result<(), VectorStoreError> {
        check_embedding_lengths(self.inner.descriptor().dimensions, &documents)?;
        let context = self
            .context(VectorStoreOperation::Add)
            .with_input_count(documents.len());
        self.observe(context, self.inner.add(documents), |_, _| {})
            .await
    }

    async fn delete(&self, ids: &[String]) -> Result<(), VectorStoreError> {
        check_ids(ids)?;
        let context = self
            .context(VectorStoreOperation::Delete)
            .with_input_count(ids.len());
        self.observe(context, self.inner.delete(ids), |_, _| {}).await
    }

    async fn similarity_search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<Document>, VectorStoreError> {
        let context = self
            .context(VectorStoreOperation::Query)
            .with_request(request);
        self.observe(
            context,
            self.inner.similarity_search(request),
            |ctx, hits: &Vec<Document>| ctx.result_count = Some(hits.len()),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryVectorStore;
    use embedding::HashingEmbeddingModel;
    use observation::{
        current_observation, keys, ObservationStatus, RecordingObservationHandler,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn observed() -> (
        ObservedVectorStore<InMemoryVectorStore>,
        Arc<RecordingObservationHandler>,
    ) {
        let recorder = Arc::new(RecordingObservationHandler::new());
        let registry = ObservationRegistry::new().with_handler(recorder.clone());
        let inner = InMemoryVectorStore::new(Arc::new(HashingEmbeddingModel::default()));
        (ObservedVectorStore::new(inner, registry), recorder)
    }

    /// Store whose calls fail or hang on demand, and which checks the current
    /// observation while running.
    struct ScriptedStore {
        fail: bool,
        hang: bool,
        saw_observation: AtomicBool,
    }

    impl ScriptedStore {
        fn new(fail: bool, hang: bool) -> Self {
            Self {
                fail,
                hang,
                saw_observation: AtomicBool::new(false),
            }
        }

        async fn run(&self) -> Result<(), VectorStoreError> {
            self.saw_observation
                .store(current_observation().is_some(), Ordering::SeqCst);
            if self.hang {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.fail {
                return Err(VectorStoreError::backend("connection refused"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl VectorStore for ScriptedStore {
        fn descriptor(&self) -> BackendDescriptor {
            BackendDescriptor::new("scripted", crate::SimilarityMetric::Cosine)
                .with_collection_name("c1")
                .with_namespace("ns")
                .with_field_name("embedding")
                .with_dimensions(Some(3))
        }

        async fn add(&self, _documents: Vec<Document>) -> Result<(), VectorStoreError> {
            self.run().await
        }

        async fn delete(&self, _ids: &[String]) -> Result<(), VectorStoreError> {
            self.run().await
        }

        async fn similarity_search(
            &self,
            _request: &SearchRequest,
        ) -> Result<Vec<Document>, VectorStoreError> {
            self.run().await.map(|_| Vec::new())
        }
    }

    fn scripted(fail: bool, hang: bool) -> (
        ObservedVectorStore<ScriptedStore>,
        Arc<RecordingObservationHandler>,
    ) {
        let recorder = Arc::new(RecordingObservationHandler::new());
        let registry = ObservationRegistry::new().with_handler(recorder.clone());
        (
            ObservedVectorStore::new(ScriptedStore::new(fail, hang), registry),
            recorder,
        )
    }

    #[tokio::test]
    async fn add_and_query_are_observed() {
        let (store, recorder) = observed();
        let doc = Document::builder("Great Depression caused mass unemployment")
            .id("a")
            .metadata("meta2", "meta2")
            .build()
            .unwrap();
        store.add(vec![doc]).await.unwrap();

        let request = SearchRequest::builder("What is Great Depression")
            .top_k(1)
            .similarity_threshold_all()
            .build()
            .unwrap();
        let hits = store.similarity_search(&request).await.unwrap();
        assert_eq!(hits.len(), 1);

        let add = recorder.stopped_by_contextual_name("vector_store simple add");
        assert_eq!(add.len(), 1);
        assert_eq!(add[0].status, ObservationStatus::Success);
        assert_eq!(add[0].low_cardinality.get(keys::DB_OPERATION_NAME), Some("add"));
        assert_eq!(add[0].high_cardinality.get(keys::DB_VECTOR_QUERY_CONTENT), Some("none"));
        assert_eq!(add[0].high_cardinality.get(keys::DB_VECTOR_DIMENSION_COUNT), Some("384"));

        let query = recorder.stopped_by_contextual_name("vector_store simple query");
        assert_eq!(query.len(), 1);
        let high = &query[0].high_cardinality;
        assert_eq!(high.get(keys::DB_VECTOR_QUERY_CONTENT), Some("What is Great Depression"));
        assert_eq!(high.get(keys::DB_VECTOR_QUERY_TOP_K), Some("1"));
        assert_eq!(high.get(keys::DB_VECTOR_QUERY_SIMILARITY_THRESHOLD), Some("0.0"));

        assert_eq!(recorder.start_count(), recorder.stop_count());
        assert!(recorder.open_observations().is_empty());
        assert!(current_observation().is_none());
    }

    #[tokio::test]
    async fn inner_call_sees_current_observation() {
        let (store, _) = scripted(false, false);
        store.delete(&["x".to_string()]).await.unwrap();
        assert!(store.inner().saw_observation.load(Ordering::SeqCst));
        assert!(current_observation().is_none());
    }

    #[tokio::test]
    async fn failure_is_recorded_and_error_propagated_unchanged() {
        let (store, recorder) = scripted(true, false);
        let err = store.add(vec![Document::new("x")]).await.unwrap_err();
        assert_eq!(err, VectorStoreError::backend("connection refused"));

        let stopped = recorder.stopped();
        assert_eq!(stopped.len(), 1);
        assert_eq!(stopped[0].status, ObservationStatus::Failed);
        assert_eq!(
            stopped[0].error.as_deref(),
            Some("backend unavailable: connection refused")
        );
        // Attributes populated before the failure are kept.
        assert_eq!(stopped[0].high_cardinality.get(keys::DB_COLLECTION_NAME), Some("c1"));
        assert_eq!(stopped[0].high_cardinality.get(keys::DB_NAMESPACE), Some("ns"));
    }

    #[tokio::test]
    async fn timeout_cancels_observation() {
        let (store, recorder) = scripted(false, true);
        let result = tokio::time::timeout(
            Duration::from_millis(20),
            store.similarity_search(&SearchRequest::query("q")),
        )
        .await;
        assert!(result.is_err());

        let stopped = recorder.stopped();
        assert_eq!(stopped.len(), 1);
        assert_eq!(stopped[0].status, ObservationStatus::Cancelled);
        assert_eq!(recorder.start_count(), 1);
        assert!(current_observation().is_none());
    }

    #[tokio::test]
    async fn rejected_arguments_open_no_observation() {
        let (store, recorder) = scripted(false, false);
        let err = store.delete(&[String::new()]).await.unwrap_err();
        assert!(!err.was_attempted());
        assert_eq!(recorder.start_count(), 0);
        assert_eq!(recorder.stop_count(), 0);
    }

    #[tokio::test]
    async fn mismatched_embedding_opens_no_observation() {
        let recorder = Arc::new(RecordingObservationHandler::new());
        let registry = ObservationRegistry::new().with_handler(recorder.clone());
        let inner = InMemoryVectorStore::new(Arc::new(HashingEmbeddingModel::new(8)));
        let store = ObservedVectorStore::new(inner, registry);

        let doc = Document::builder("short vector")
            .embedding(vec![1.0, 0.0])
            .build()
            .unwrap();
        let err = store.add(vec![doc]).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::InvalidArgument(_)));
        assert!(!err.was_attempted());
        assert_eq!(recorder.start_count(), 0);
        assert_eq!(recorder.stop_count(), 0);
        assert!(store.inner().is_empty().unwrap());
    }

    #[tokio::test]
    async fn inconsistent_embeddings_open_no_observation() {
        // The scripted descriptor reports 3 dimensions.
        let (store, recorder) = scripted(false, false);
        let docs = vec![
            Document::builder("a").id("a").embedding(vec![1.0, 0.0, 0.0]).build().unwrap(),
            Document::builder("b").id("b").embedding(vec![1.0, 0.0]).build().unwrap(),
        ];
        let err = store.add(docs).await.unwrap_err();
        assert!(!err.was_attempted());
        assert_eq!(recorder.start_count(), 0);
    }

    #[tokio::test]
    async fn custom_convention_is_used() {
        struct Renamed;
        impl VectorStoreObservationConvention for Renamed {
            fn name(&self) -> &str {
                "custom.vector"
            }
            fn contextual_name(&self, ctx: &VectorStoreObservationContext) -> String {
                format!("custom {}", ctx.operation)
            }
            fn low_cardinality_key_values(
                &self,
                ctx: &VectorStoreObservationContext,
            ) -> observation::KeyValues {
                observation::KeyValues::new().and("op", ctx.operation.as_str())
            }
            fn high_cardinality_key_values(
                &self,
                ctx: &VectorStoreObservationContext,
            ) -> observation::KeyValues {
                observation::KeyValues::new()
                    .and("results", ctx.result_count.map_or("none".into(), |n| n.to_string()))
            }
        }

        let (store, recorder) = scripted(false, false);
        let store = store.with_convention(Arc::new(Renamed));
        store
            .similarity_search(&SearchRequest::query("q"))
            .await
            .unwrap();
        let stopped = recorder.stopped_by_contextual_name("custom query");
        assert_eq!(stopped.len(), 1);
        assert_eq!(stopped[0].name, "custom.vector");
        assert_eq!(stopped[0].high_cardinality.get("results"), Some("0"));
    }
}
