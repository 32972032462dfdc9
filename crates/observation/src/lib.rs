//! Telemetry contract for vector store calls.
//!
//! Each store call produces one observation: a
//! [`VectorStoreObservationContext`] is built before the backend runs, a
//! [`VectorStoreObservationConvention`] turns it into a name and two attribute
//! groups, and an [`ObservationRegistry`] fans start/stop events out to
//! [`ObservationHandler`]s.
//!
//! The lifecycle is enforced by [`ActiveObservation`]: `stop`/`fail` consume
//! it, and dropping it unstopped records a cancellation, so every start has
//! exactly one stop. While a call runs, [`current_observation`] exposes it to
//! code on the same task.
//!
//! ```
//! use std::sync::Arc;
//! use observation::{
//!     DefaultVectorStoreObservationConvention, ObservationRegistry,
//!     RecordingObservationHandler, VectorStoreObservationContext, VectorStoreOperation,
//! };
//!
//! let recorder = Arc::new(RecordingObservationHandler::new());
//! let registry = ObservationRegistry::new().with_handler(recorder.clone());
//!
//! let ctx = VectorStoreObservationContext::new(VectorStoreOperation::Add, "simple", "cosine");
//! let observation = registry.start(ctx, Arc::new(DefaultVectorStoreObservationConvention));
//! observation.stop();
//!
//! let stopped = recorder.stopped_by_contextual_name("vector_store simple add");
//! assert_eq!(stopped[0].low_cardinality.get("db.operation.name"), Some("add"));
//! ```

mod context;
mod convention;
mod handler;
pub mod keys;
mod registry;

pub use crate::context::{VectorStoreObservationContext, VectorStoreOperation};
pub use crate::convention::{
    DefaultVectorStoreObservationConvention, KeyValue, KeyValues, VectorStoreObservationConvention,
};
pub use crate::handler::{
    MetricsObservationHandler, RecordingObservationHandler, TracingObservationHandler,
};
pub use crate::registry::{
    current_observation, ActiveObservation, CurrentObservation, ObservationHandler,
    ObservationRegistry, ObservationSnapshot, ObservationStatus,
};
