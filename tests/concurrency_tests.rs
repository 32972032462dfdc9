//! Concurrent calls keep observations balanced and task-local.

use std::sync::Arc;
use std::time::Duration;

use vectorscope::{
    Document, HashingEmbeddingModel, InMemoryVectorStore, ObservationRegistry, ObservationStatus,
    ObservedVectorStore, RecordingObservationHandler, SearchRequest, VectorStore,
    current_observation,
};

fn observed() -> (
    Arc<ObservedVectorStore<InMemoryVectorStore>>,
    Arc<RecordingObservationHandler>,
) {
    let recorder = Arc::new(RecordingObservationHandler::new());
    let registry = ObservationRegistry::new().with_handler(recorder.clone());
    let inner = InMemoryVectorStore::new(Arc::new(HashingEmbeddingModel::default()));
    (Arc::new(ObservedVectorStore::new(inner, registry)), recorder)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_and_searches_balance() {
    let (store, recorder) = observed();

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let doc = Document::builder(format!("document number {i} about vectors"))
                .id(format!("doc-{i}"))
                .build()
                .expect("valid document");
            store.add(vec![doc]).await.expect("add");
            assert!(current_observation().is_none());

            let hits = store
                .similarity_search(&SearchRequest::query(format!("number {i}")))
                .await
                .expect("search");
            assert!(!hits.is_empty());
            assert!(current_observation().is_none());
        }));
    }
    for handle in handles {
        handle.await.expect("task");
    }

    assert_eq!(recorder.start_count(), 32);
    assert_eq!(recorder.stop_count(), 32);
    assert!(recorder.open_observations().is_empty());
    assert!(
        recorder
            .stopped()
            .iter()
            .all(|obs| obs.status == ObservationStatus::Success && obs.parent_id.is_none())
    );
    assert_eq!(store.inner().len().expect("len"), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn aborted_tasks_close_their_observations() {
    let (store, recorder) = observed();

    let handle = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            loop {
                let _ = store.similarity_search_query("spin").await;
                tokio::task::yield_now().await;
            }
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.abort();
    let _ = handle.await;

    assert_eq!(recorder.start_count(), recorder.stop_count());
    assert!(recorder.open_observations().is_empty());
}
