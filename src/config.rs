//! YAML configuration for a vectorscope deployment.
//!
//! One file selects the embedding provider, the storage backend, which
//! observation handlers are installed and how logs are emitted.
//!
//! ```yaml
//! version: "1.0"
//! name: "local"
//!
//! embedding:
//!   mode: "hashing"
//!   model_name: "hashing-bow"
//!   dimensions: 384
//!
//! store:
//!   backend: "redb"
//!   path: "/var/lib/vectorscope/documents.redb"
//!   table: "documents"
//!   compression:
//!     codec: "zstd"
//!     level: 3
//!
//! observation:
//!   tracing: true
//!   metrics: false
//!   high_cardinality_logs: true
//!   similarity_metric: "cosine"
//!
//! logging:
//!   level: "info"
//!   json: false
//! ```
//!
//! `VECTORSCOPE_LOG_LEVEL` and `VECTORSCOPE_STORE_PATH` override the file.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use embedding::{EmbeddingConfig, build_model};
use observation::{MetricsObservationHandler, ObservationRegistry, TracingObservationHandler};
use serde::{Deserialize, Serialize};
use store::{BackendConfig, ObservedVectorStore, SimilarityMetric, VectorStore};
use thiserror::Error;
use tracing::info;

/// Overrides `logging.level`.
pub const ENV_LOG_LEVEL: &str = "VECTORSCOPE_LOG_LEVEL";
/// Overrides the redb `store.path`; switches an in-memory store to redb.
pub const ENV_STORE_PATH: &str = "VECTORSCOPE_STORE_PATH";

/// Errors that can occur when loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("failed to build store: {0}")]
    Build(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VectorscopeConfig {
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub store: BackendConfig,

    #[serde(default)]
    pub observation: ObservationYamlConfig,

    #[serde(default)]
    pub logging: LoggingYamlConfig,
}

impl VectorscopeConfig {
    /// Load a YAML file, apply environment overrides and validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        let mut config: VectorscopeConfig = serde_yaml::from_str(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate YAML. Environment overrides are not applied.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: VectorscopeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `VECTORSCOPE_*` overrides looked up through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.logging.level = level;
        }
        if let Some(path) = lookup(ENV_STORE_PATH).filter(|v| !v.trim().is_empty()) {
            match &mut self.store {
                BackendConfig::Redb { path: current, .. } => *current = path,
                BackendConfig::InMemory => self.store = BackendConfig::redb(path),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.embedding
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("embedding: {err}")))?;

        if let BackendConfig::Redb { path, table, .. } = &self.store {
            if path.trim().is_empty() {
                return Err(ConfigLoadError::Validation(
                    "store.path must not be empty".to_string(),
                ));
            }
            if table.trim().is_empty() {
                return Err(ConfigLoadError::Validation(
                    "store.table must not be empty".to_string(),
                ));
            }
        }

        self.logging.validate()?;
        Ok(())
    }

    /// Registry with the handlers enabled under `observation`.
    pub fn registry(&self) -> ObservationRegistry {
        let mut registry = ObservationRegistry::new();
        if self.observation.tracing {
            registry = registry.with_handler(Arc::new(
                TracingObservationHandler::new()
                    .with_high_cardinality(self.observation.high_cardinality_logs),
            ));
        }
        if self.observation.metrics {
            registry = registry.with_handler(Arc::new(MetricsObservationHandler::new()));
        }
        registry
    }

    /// Build the embedding model and backend, wrapped so every call is observed.
    pub fn build_store(
        &self,
    ) -> Result<ObservedVectorStore<Arc<dyn VectorStore>>, ConfigLoadError> {
        let model = build_model(&self.embedding)
            .map_err(|err| ConfigLoadError::Build(err.to_string()))?;
        let backend = self
            .store
            .build(model, self.observation.similarity_metric)
            .map_err(|err| ConfigLoadError::Build(err.to_string()))?;

        let descriptor = backend.descriptor();
        info!(
            db_system = %descriptor.database_system,
            similarity_metric = %descriptor.similarity_metric,
            embedding_model = %self.embedding.model_name,
            "vector_store_built"
        );
        Ok(ObservedVectorStore::new(backend, self.registry()))
    }
}

impl Default for VectorscopeConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            embedding: EmbeddingConfig::default(),
            store: BackendConfig::default(),
            observation: ObservationYamlConfig::default(),
            logging: LoggingYamlConfig::default(),
        }
    }
}

/// Which observation handlers to install.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationYamlConfig {
    #[serde(default = "true_value")]
    pub tracing: bool,

    #[serde(default)]
    pub metrics: bool,

    /// Include high-cardinality attributes (query text, collection) in log events.
    #[serde(default = "true_value")]
    pub high_cardinality_logs: bool,

    #[serde(default)]
    pub similarity_metric: SimilarityMetric,
}

impl Default for ObservationYamlConfig {
    fn default() -> Self {
        Self {
            tracing: true,
            metrics: false,
            high_cardinality_logs: true,
            similarity_metric: SimilarityMetric::default(),
        }
    }
}

/// Log output settings for the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingYamlConfig {
    /// `EnvFilter` directive, e.g. `info` or `store=debug,info`.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl LoggingYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.level.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LoggingYamlConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn true_value() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
