use std::sync::Mutex;

use crate::registry::{ObservationHandler, ObservationSnapshot};

#[derive(Debug, Default)]
struct Recorded {
    started: Vec<ObservationSnapshot>,
    stopped: Vec<ObservationSnapshot>,
}

/// In-memory sink that keeps every start and stop snapshot.
///
/// Meant for tests and harnesses that assert on emitted telemetry.
#[derive(Debug, Default)]
pub struct RecordingObservationHandler {
    recorded: Mutex<Recorded>,
}

impl RecordingObservationHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Recorded) -> R) -> R {
        // A poisoned lock only means a handler panicked mid-push; the data is still usable.
        let mut guard = self
            .recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub fn start_count(&self) -> usize {
        self.with(|r| r.started.len())
    }

    pub fn stop_count(&self) -> usize {
        self.with(|r| r.stopped.len())
    }

    pub fn started(&self) -> Vec<ObservationSnapshot> {
        self.with(|r| r.started.clone())
    }

    pub fn stopped(&self) -> Vec<ObservationSnapshot> {
        self.with(|r| r.stopped.clone())
    }

    /// Observations started but not yet stopped, as of their start snapshot.
    pub fn open_observations(&self) -> Vec<ObservationSnapshot> {
        self.with(|r| {
            r.started
                .iter()
                .filter(|s| !r.stopped.iter().any(|done| done.id == s.id))
                .cloned()
                .collect()
        })
    }

    /// Stop snapshots whose contextual name equals `contextual_name`.
    pub fn stopped_by_contextual_name(&self, contextual_name: &str) -> Vec<ObservationSnapshot> {
        self.with(|r| {
            r.stopped
                .iter()
                .filter(|s| s.contextual_name == contextual_name)
                .cloned()
                .collect()
        })
    }

    pub fn clear(&self) {
        self.with(|r| {
            r.started.clear();
            r.stopped.clear();
        })
    }
}

impl ObservationHandler for RecordingObservationHandler {
    fn on_start(&self, snapshot: &ObservationSnapshot) {
        self.with(|r| r.started.push(snapshot.clone()));
    }

    fn on_stop(&self, snapshot: &ObservationSnapshot) {
        self.with(|r| r.stopped.push(snapshot.clone()));
    }
}
