//! Attribute keys and fixed values emitted by the default convention.
//!
//! Names follow the OpenTelemetry database semantic conventions where one
//! exists (`db.system`, `db.collection.name`, ...).

/// Shared name of every vector store observation.
pub const OBSERVATION_NAME: &str = "db.vector.client.operation";

/// Placeholder for attributes that do not apply to a backend or operation.
pub const NONE: &str = "none";

/// Value of [`VECTORSCOPE_KIND`] for vector store telemetry.
pub const KIND_VECTOR_STORE: &str = "vector_store";

// Low cardinality
pub const DB_OPERATION_NAME: &str = "db.operation.name";
pub const DB_SYSTEM: &str = "db.system";
pub const VECTORSCOPE_KIND: &str = "vectorscope.kind";

// High cardinality
pub const DB_VECTOR_QUERY_CONTENT: &str = "db.vector.query.content";
pub const DB_VECTOR_DIMENSION_COUNT: &str = "db.vector.dimension_count";
pub const DB_COLLECTION_NAME: &str = "db.collection.name";
pub const DB_NAMESPACE: &str = "db.namespace";
pub const DB_VECTOR_FIELD_NAME: &str = "db.vector.field_name";
pub const DB_SEARCH_SIMILARITY_METRIC: &str = "db.search.similarity_metric";
pub const DB_VECTOR_QUERY_TOP_K: &str = "db.vector.query.top_k";
pub const DB_VECTOR_QUERY_SIMILARITY_THRESHOLD: &str = "db.vector.query.similarity_threshold";
