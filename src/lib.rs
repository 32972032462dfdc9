//! Workspace umbrella crate for vectorscope.
//!
//! Re-exports the document model, usage normalizer, embedding providers,
//! observation layer and stores so applications depend on one crate, and
//! adds YAML configuration plus a logging bootstrap for binaries.
//!
//! ```no_run
//! use vectorscope::{SearchRequest, VectorStore, VectorscopeConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = VectorscopeConfig::from_file("vectorscope.yaml")?;
//! vectorscope::init_tracing(&config.logging)?;
//! let store = config.build_store()?;
//! let hits = store
//!     .similarity_search(&SearchRequest::builder("what is a vector").top_k(3).build()?)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;

pub use document::{
    DOCUMENT_ID_NAMESPACE, DEFAULT_TOP_K, Document, DocumentBuilder, DocumentError,
    FilterExpression, Metadata, MetadataValue, SIMILARITY_THRESHOLD_ACCEPT_ALL, SearchRequest,
    SearchRequestBuilder, derive_document_id,
};
pub use embedding::{
    ApiEmbeddingModel, EmbeddingConfig, EmbeddingError, EmbeddingMode, EmbeddingModel,
    EmbeddingResponse, HashingEmbeddingModel, build_model,
};
pub use observation::{
    ActiveObservation, CurrentObservation, DefaultVectorStoreObservationConvention, KeyValue,
    KeyValues, MetricsObservationHandler, ObservationHandler, ObservationRegistry,
    ObservationSnapshot, ObservationStatus, RecordingObservationHandler,
    TracingObservationHandler, VectorStoreObservationContext, VectorStoreObservationConvention,
    VectorStoreOperation, current_observation, keys,
};
#[cfg(feature = "backend-redb")]
pub use store::RedbVectorStore;
pub use store::{
    BackendConfig, BackendDescriptor, CompressionCodec, CompressionConfig, InMemoryVectorStore,
    ObservedVectorStore, SimilarityMetric, VectorStore, VectorStoreError,
};
pub use usage::{RawUsage, Usage, UsageError, normalize, normalize_value};

pub use crate::config::{
    ConfigLoadError, LoggingYamlConfig, ObservationYamlConfig, VectorscopeConfig,
};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber described by `logging`.
///
/// `RUST_LOG`, when set, takes precedence over `logging.level`. Fails if a
/// subscriber is already installed or the filter directive does not parse.
pub fn init_tracing(logging: &LoggingYamlConfig) -> Result<(), ConfigLoadError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .map_err(|err| ConfigLoadError::Validation(format!("logging.level: {err}")))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| ConfigLoadError::Validation(format!("tracing subscriber: {err}")))
}
