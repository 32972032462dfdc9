use tracing::{debug, info, warn};

use crate::registry::{ObservationHandler, ObservationSnapshot, ObservationStatus};

/// Emits one structured `tracing` event per start and per stop.
///
/// High-cardinality attributes are included by default; turn them off when
/// logs are shipped somewhere that indexes every field.
#[derive(Debug, Clone)]
pub struct TracingObservationHandler {
    include_high_cardinality: bool,
}

impl TracingObservationHandler {
    pub fn new() -> Self {
        Self {
            include_high_cardinality: true,
        }
    }

    pub fn with_high_cardinality(mut self, include: bool) -> Self {
        self.include_high_cardinality = include;
        self
    }

    fn high(&self, snapshot: &ObservationSnapshot) -> String {
        if self.include_high_cardinality {
            snapshot.high_cardinality.to_string()
        } else {
            String::new()
        }
    }
}

impl Default for TracingObservationHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationHandler for TracingObservationHandler {
    fn on_start(&self, snapshot: &ObservationSnapshot) {
        debug!(
            observation_id = snapshot.id,
            parent_id = ?snapshot.parent_id,
            name = %snapshot.name,
            contextual_name = %snapshot.contextual_name,
            low = %snapshot.low_cardinality,
            "observation_start"
        );
    }

    fn on_stop(&self, snapshot: &ObservationSnapshot) {
        let elapsed_micros = snapshot.elapsed.as_micros() as u64;
        let high = self.high(snapshot);
        match snapshot.status {
            ObservationStatus::Success | ObservationStatus::Running => info!(
                observation_id = snapshot.id,
                name = %snapshot.name,
                contextual_name = %snapshot.contextual_name,
                low = %snapshot.low_cardinality,
                high = %high,
                elapsed_micros,
                "observation_success"
            ),
            ObservationStatus::Failed => warn!(
                observation_id = snapshot.id,
                name = %snapshot.name,
                contextual_name = %snapshot.contextual_name,
                low = %snapshot.low_cardinality,
                high = %high,
                error = snapshot.error.as_deref().unwrap_or_default(),
                elapsed_micros,
                "observation_failure"
            ),
            ObservationStatus::Cancelled => warn!(
                observation_id = snapshot.id,
                name = %snapshot.name,
                contextual_name = %snapshot.contextual_name,
                low = %snapshot.low_cardinality,
                elapsed_micros,
                "observation_cancelled"
            ),
        }
    }
}
