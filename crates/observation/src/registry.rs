//! Observation lifecycle: start, task-local scope, exactly-once stop.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::futures::TaskLocalFuture;

use crate::context::VectorStoreObservationContext;
use crate::convention::{KeyValues, VectorStoreObservationConvention};

static NEXT_OBSERVATION_ID: AtomicU64 = AtomicU64::new(1);

tokio::task_local! {
    static CURRENT: CurrentObservation;
}

/// How an observation ended, or `Running` while it is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationStatus {
    Running,
    Success,
    Failed,
    /// The call's future was dropped before it completed.
    Cancelled,
}

impl ObservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationStatus::Running => "running",
            ObservationStatus::Success => "success",
            ObservationStatus::Failed => "failed",
            ObservationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ObservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What handlers see on start and on stop.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSnapshot {
    pub id: u64,
    pub parent_id: Option<u64>,
    pub name: String,
    pub contextual_name: String,
    pub low_cardinality: KeyValues,
    pub high_cardinality: KeyValues,
    pub status: ObservationStatus,
    pub error: Option<String>,
    /// Zero on start.
    pub elapsed: Duration,
}

/// Receives observation lifecycle events. Handlers must not block.
pub trait ObservationHandler: Send + Sync {
    fn on_start(&self, _snapshot: &ObservationSnapshot) {}

    fn on_stop(&self, snapshot: &ObservationSnapshot);
}

/// Identity of the observation the running task is inside of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentObservation {
    pub id: u64,
    pub name: String,
    pub contextual_name: String,
}

/// The observation the current task is executing under, if any.
///
/// `None` outside an instrumented call and on tasks spawned from one.
pub fn current_observation() -> Option<CurrentObservation> {
    CURRENT.try_with(Clone::clone).ok()
}

/// Fans observation events out to a set of handlers. Cheap to clone.
#[derive(Clone, Default)]
pub struct ObservationRegistry {
    handlers: Arc<Vec<Arc<dyn ObservationHandler>>>,
}

impl ObservationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with no handlers; observations still run their lifecycle.
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn with_handler(mut self, handler: Arc<dyn ObservationHandler>) -> Self {
        Arc::make_mut(&mut self.handlers).push(handler);
        self
    }

    pub fn is_noop(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Open an observation for `context` and notify handlers.
    pub fn start(
        &self,
        context: VectorStoreObservationContext,
        convention: Arc<dyn VectorStoreObservationConvention>,
    ) -> ActiveObservation {
        let observation = ActiveObservation {
            id: NEXT_OBSERVATION_ID.fetch_add(1, Ordering::Relaxed),
            parent_id: current_observation().map(|current| current.id),
            registry: self.clone(),
            convention,
            context,
            started: Instant::now(),
            stopped: false,
        };
        let snapshot = observation.snapshot(ObservationStatus::Running, None, Duration::ZERO);
        for handler in self.handlers.iter() {
            handler.on_start(&snapshot);
        }
        observation
    }

    fn notify_stop(&self, snapshot: &ObservationSnapshot) {
        for handler in self.handlers.iter() {
            handler.on_stop(snapshot);
        }
    }
}

impl fmt::Debug for ObservationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservationRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// An open observation.
///
/// Stop it with [`stop`](Self::stop) or [`fail`](Self::fail). Dropping it
/// without either stops it as [`ObservationStatus::Cancelled`], so a call
/// whose future is dropped mid-flight is still closed exactly once.
pub struct ActiveObservation {
    id: u64,
    parent_id: Option<u64>,
    registry: ObservationRegistry,
    convention: Arc<dyn VectorStoreObservationConvention>,
    context: VectorStoreObservationContext,
    started: Instant,
    stopped: bool,
}

impl ActiveObservation {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn parent_id(&self) -> Option<u64> {
        self.parent_id
    }

    pub fn context(&self) -> &VectorStoreObservationContext {
        &self.context
    }

    /// Mutate the context with result-derived fields before stopping.
    pub fn context_mut(&mut self) -> &mut VectorStoreObservationContext {
        &mut self.context
    }

    /// Run `future` with this observation as the task's current observation.
    /// The previous current observation is restored when the future completes
    /// or is dropped.
    pub fn scope<F: Future>(&self, future: F) -> TaskLocalFuture<CurrentObservation, F> {
        CURRENT.scope(self.current(), future)
    }

    fn current(&self) -> CurrentObservation {
        CurrentObservation {
            id: self.id,
            name: self.convention.name().to_string(),
            contextual_name: self.convention.contextual_name(&self.context),
        }
    }

    pub fn stop(mut self) -> ObservationSnapshot {
        self.finish(ObservationStatus::Success, None)
    }

    pub fn fail(mut self, error: &dyn fmt::Display) -> ObservationSnapshot {
        self.finish(ObservationStatus::Failed, Some(error.to_string()))
    }

    fn finish(&mut self, status: ObservationStatus, error: Option<String>) -> ObservationSnapshot {
        self.stopped = true;
        // Attributes are recomputed so result-derived fields are included.
        let snapshot = self.snapshot(status, error, self.started.elapsed());
        self.registry.notify_stop(&snapshot);
        snapshot
    }

    fn snapshot(
        &self,
        status: ObservationStatus,
        error: Option<String>,
        elapsed: Duration,
    ) -> ObservationSnapshot {
        ObservationSnapshot {
            id: self.id,
            parent_id: self.parent_id,
            name: self.convention.name().to_string(),
            contextual_name: self.convention.contextual_name(&self.context),
            low_cardinality: self.convention.low_cardinality_key_values(&self.context),
            high_cardinality: self.convention.high_cardinality_key_values(&self.context),
            status,
            error,
            elapsed,
        }
    }
}

impl Drop for ActiveObservation {
    fn drop(&mut self) {
        if !self.stopped {
            self.finish(ObservationStatus::Cancelled, None);
        }
    }
}

impl fmt::Debug for ActiveObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveObservation")
            .field("id", &self.id)
            .field("parent_id", &self.parent_id)
            .field("operation", &self.context.operation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::VectorStoreOperation;
    use crate::convention::DefaultVectorStoreObservationConvention;
    use crate::handler::RecordingObservationHandler;

    fn context(op: VectorStoreOperation) -> VectorStoreObservationContext {
        VectorStoreObservationContext::new(op, "simple", "cosine")
    }

    fn convention() -> Arc<dyn VectorStoreObservationConvention> {
        Arc::new(DefaultVectorStoreObservationConvention)
    }

    fn recording_registry() -> (ObservationRegistry, Arc<RecordingObservationHandler>) {
        let recorder = Arc::new(RecordingObservationHandler::new());
        let registry = ObservationRegistry::new().with_handler(recorder.clone());
        (registry, recorder)
    }

    #[test]
    fn start_then_stop_notifies_once_each() {
        let (registry, recorder) = recording_registry();
        let observation = registry.start(context(VectorStoreOperation::Add), convention());
        assert_eq!(recorder.start_count(), 1);
        assert_eq!(recorder.open_observations().len(), 1);

        let snapshot = observation.stop();
        assert_eq!(snapshot.status, ObservationStatus::Success);
        assert_eq!(recorder.stop_count(), 1);
        assert!(recorder.open_observations().is_empty());
    }

    #[test]
    fn drop_without_stop_is_cancelled() {
        let (registry, recorder) = recording_registry();
        {
            let _observation = registry.start(context(VectorStoreOperation::Delete), convention());
        }
        let stopped = recorder.stopped();
        assert_eq!(stopped.len(), 1);
        assert_eq!(stopped[0].status, ObservationStatus::Cancelled);
    }

    #[test]
    fn fail_records_error() {
        let (registry, recorder) = recording_registry();
        let observation = registry.start(context(VectorStoreOperation::Query), convention());
        observation.fail(&"backend unavailable");
        let stopped = recorder.stopped();
        assert_eq!(stopped.len(), 1);
        assert_eq!(stopped[0].status, ObservationStatus::Failed);
        assert_eq!(stopped[0].error.as_deref(), Some("backend unavailable"));
    }

    #[test]
    fn stop_recomputes_attributes_from_mutated_context() {
        let (registry, recorder) = recording_registry();
        let mut observation = registry.start(context(VectorStoreOperation::Add), convention());
        observation.context_mut().dimensions = Some(384);
        observation.stop();

        let started = recorder.started();
        assert_eq!(
            started[0].high_cardinality.get("db.vector.dimension_count"),
            Some("none")
        );
        let stopped = recorder.stopped();
        assert_eq!(
            stopped[0].high_cardinality.get("db.vector.dimension_count"),
            Some("384")
        );
    }

    #[test]
    fn noop_registry_has_no_handlers() {
        let registry = ObservationRegistry::noop();
        assert!(registry.is_noop());
        let observation = registry.start(context(VectorStoreOperation::Add), convention());
        let snapshot = observation.stop();
        assert_eq!(snapshot.contextual_name, "vector_store simple add");
    }

    #[test]
    fn ids_are_unique() {
        let registry = ObservationRegistry::noop();
        let a = registry.start(context(VectorStoreOperation::Add), convention());
        let b = registry.start(context(VectorStoreOperation::Add), convention());
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn scope_sets_and_restores_current() {
        assert!(current_observation().is_none());
        let registry = ObservationRegistry::noop();
        let outer = registry.start(context(VectorStoreOperation::Query), convention());
        let outer_id = outer.id();

        let registry_inner = registry.clone();
        let (seen_outer, inner_parent, seen_inner, after_inner) = outer
            .scope(async move {
                let seen_outer = current_observation().map(|c| c.id);
                let inner =
                    registry_inner.start(context(VectorStoreOperation::Add), convention());
                let inner_parent = inner.parent_id();
                let inner_id = inner.id();
                let seen_inner = inner.scope(async { current_observation().map(|c| c.id) }).await;
                inner.stop();
                let after_inner = current_observation().map(|c| c.id);
                (seen_outer, inner_parent, seen_inner.map(|id| id == inner_id), after_inner)
            })
            .await;

        assert_eq!(seen_outer, Some(outer_id));
        assert_eq!(inner_parent, Some(outer_id));
        assert_eq!(seen_inner, Some(true));
        assert_eq!(after_inner, Some(outer_id));
        outer.stop();
        assert!(current_observation().is_none());
    }

    #[tokio::test]
    async fn current_is_task_local() {
        let registry = ObservationRegistry::noop();
        let observation = registry.start(context(VectorStoreOperation::Add), convention());
        let spawned = observation
            .scope(async { tokio::spawn(async { current_observation() }).await })
            .await
            .unwrap();
        assert!(spawned.is_none());
        observation.stop();
    }
}
