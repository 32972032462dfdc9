use std::fmt;

use crate::context::VectorStoreObservationContext;
use crate::keys;

/// One attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered attribute set with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValues {
    entries: Vec<KeyValue>,
}

impl KeyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key=value`, replacing any previous value for `key`.
    pub fn and(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(KeyValue::new(key, value));
        self
    }

    pub fn insert(&mut self, kv: KeyValue) {
        match self.entries.iter_mut().find(|e| e.key == kv.key) {
            Some(existing) => existing.value = kv.value,
            None => self.entries.push(kv),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KeyValue> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a KeyValues {
    type Item = &'a KeyValue;
    type IntoIter = std::slice::Iter<'a, KeyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<KeyValue> for KeyValues {
    fn from_iter<I: IntoIterator<Item = KeyValue>>(iter: I) -> Self {
        let mut kvs = KeyValues::new();
        for kv in iter {
            kvs.insert(kv);
        }
        kvs
    }
}

impl fmt::Display for KeyValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kv) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", kv.key, kv.value)?;
        }
        Ok(())
    }
}

/// Maps an observation context to a name and two attribute groups.
///
/// Low-cardinality attributes have bounded value sets and may be used as
/// metric labels. High-cardinality attributes belong on traces only.
/// Implementations must be pure: the same context yields the same output.
pub trait VectorStoreObservationConvention: Send + Sync {
    fn name(&self) -> &str;

    fn contextual_name(&self, context: &VectorStoreObservationContext) -> String;

    fn low_cardinality_key_values(&self, context: &VectorStoreObservationContext) -> KeyValues;

    fn high_cardinality_key_values(&self, context: &VectorStoreObservationContext) -> KeyValues;
}

/// Convention used unless a store is given another one.
///
/// Every attribute is always present; values that do not apply are
/// [`keys::NONE`], so dashboards see a fixed schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVectorStoreObservationConvention;

impl VectorStoreObservationConvention for DefaultVectorStoreObservationConvention {
    fn name(&self) -> &str {
        keys::OBSERVATION_NAME
    }

    fn contextual_name(&self, context: &VectorStoreObservationContext) -> String {
        format!(
            "{} {} {}",
            keys::KIND_VECTOR_STORE,
            context.database_system,
            context.operation
        )
    }

    fn low_cardinality_key_values(&self, context: &VectorStoreObservationContext) -> KeyValues {
        KeyValues::new()
            .and(keys::DB_OPERATION_NAME, context.operation.as_str())
            .and(keys::DB_SYSTEM, context.database_system.as_str())
            .and(keys::VECTORSCOPE_KIND, keys::KIND_VECTOR_STORE)
    }

    fn high_cardinality_key_values(&self, context: &VectorStoreObservationContext) -> KeyValues {
        KeyValues::new()
            .and(keys::DB_VECTOR_QUERY_CONTENT, or_none(context.query.as_deref()))
            .and(
                keys::DB_VECTOR_DIMENSION_COUNT,
                or_none(context.dimensions.map(|d| d.to_string())),
            )
            .and(keys::DB_COLLECTION_NAME, or_none(context.collection_name.as_deref()))
            .and(keys::DB_NAMESPACE, or_none(context.namespace.as_deref()))
            .and(keys::DB_VECTOR_FIELD_NAME, or_none(context.field_name.as_deref()))
            .and(keys::DB_SEARCH_SIMILARITY_METRIC, context.similarity_metric.as_str())
            .and(
                keys::DB_VECTOR_QUERY_TOP_K,
                or_none(context.top_k.map(|k| k.to_string())),
            )
            .and(
                keys::DB_VECTOR_QUERY_SIMILARITY_THRESHOLD,
                // Debug keeps the decimal point: 0.0 rather than 0.
                or_none(context.similarity_threshold.map(|t| format!("{t:?}"))),
            )
    }
}

fn or_none<S: Into<String>>(value: Option<S>) -> String {
    value.map_or_else(|| keys::NONE.to_string(), Into::into)
}
