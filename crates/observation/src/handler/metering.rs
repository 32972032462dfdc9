use metrics::{counter, histogram, Label};

use crate::registry::{ObservationHandler, ObservationSnapshot};

/// Records a counter and a duration histogram per stopped observation.
///
/// Labels are the low-cardinality attributes plus `status`. High-cardinality
/// attributes never become labels. Metric names are `{name}.count` and
/// `{name}.duration_seconds`, `{name}` being the observation name. Installing
/// a recorder/exporter is left to the application.
#[derive(Debug, Clone, Default)]
pub struct MetricsObservationHandler;

impl MetricsObservationHandler {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn labels(snapshot: &ObservationSnapshot) -> Vec<Label> {
        let mut labels: Vec<Label> = snapshot
            .low_cardinality
            .iter()
            .map(|kv| Label::new(kv.key.clone(), kv.value.clone()))
            .collect();
        labels.push(Label::new("status", snapshot.status.as_str()));
        labels
    }
}

impl ObservationHandler for MetricsObservationHandler {
    fn on_stop(&self, snapshot: &ObservationSnapshot) {
        let labels = Self::labels(snapshot);
        counter!(format!("{}.count", snapshot.name), labels.clone()).increment(1);
        histogram!(format!("{}.duration_seconds", snapshot.name), labels)
            .record(snapshot.elapsed.as_secs_f64());
    }
}
