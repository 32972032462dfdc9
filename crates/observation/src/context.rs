use std::fmt;

use document::{FilterExpression, SearchRequest};

/// Kind of vector store call being observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorStoreOperation {
    Add,
    Delete,
    Query,
}

impl VectorStoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorStoreOperation::Add => "add",
            VectorStoreOperation::Delete => "delete",
            VectorStoreOperation::Query => "query",
        }
    }
}

impl fmt::Display for VectorStoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a convention may turn into attributes, for one call.
///
/// Built right before the backend is invoked and updated once from the result
/// (`dimensions`, `result_count`). Fields that do not apply stay `None` and
/// are rendered by the convention as a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorStoreObservationContext {
    pub operation: VectorStoreOperation,
    pub database_system: String,
    pub collection_name: Option<String>,
    pub namespace: Option<String>,
    pub field_name: Option<String>,
    pub similarity_metric: String,
    pub dimensions: Option<usize>,
    pub query: Option<String>,
    pub top_k: Option<usize>,
    pub similarity_threshold: Option<f64>,
    pub filter: Option<FilterExpression>,
    /// Documents handed to `add` or ids handed to `delete`.
    pub input_count: Option<usize>,
    /// Hits returned by a query.
    pub result_count: Option<usize>,
}

impl VectorStoreObservationContext {
    pub fn new(
        operation: VectorStoreOperation,
        database_system: impl Into<String>,
        similarity_metric: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            database_system: database_system.into(),
            collection_name: None,
            namespace: None,
            field_name: None,
            similarity_metric: similarity_metric.into(),
            dimensions: None,
            query: None,
            top_k: None,
            similarity_threshold: None,
            filter: None,
            input_count: None,
            result_count: None,
        }
    }

    pub fn with_collection_name(mut self, name: Option<String>) -> Self {
        self.collection_name = name;
        self
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_field_name(mut self, field_name: Option<String>) -> Self {
        self.field_name = field_name;
        self
    }

    pub fn with_dimensions(mut self, dimensions: Option<usize>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_input_count(mut self, count: usize) -> Self {
        self.input_count = Some(count);
        self
    }

    /// Copy the effective query parameters out of `request`.
    pub fn with_request(mut self, request: &SearchRequest) -> Self {
        self.query = Some(request.query_text().to_string());
        self.top_k = Some(request.top_k());
        self.similarity_threshold = Some(request.similarity_threshold());
        self.filter = request.filter().cloned();
        self
    }
}
