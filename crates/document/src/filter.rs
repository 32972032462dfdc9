//! Portable metadata filter expressions.
//!
//! Filters are evaluated in-process against a document's [`Metadata`]; backends
//! that can push predicates down are free to translate them. Stores in this
//! workspace drop non-matching candidates before scoring, so a filter never
//! costs a similarity computation.
//!
//! Semantics:
//! - A missing key never satisfies `Eq`, `Gt`, `Gte`, `Lt`, `Lte` or `In`.
//! - `Ne` and `Nin` are the negations of `Eq` and `In`, so a missing key satisfies them.
//! - Integers and floats compare numerically; other mixed types are unordered.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::types::{Metadata, MetadataValue};

/// Boolean expression over metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterExpression {
    Eq { key: String, value: MetadataValue },
    Ne { key: String, value: MetadataValue },
    Gt { key: String, value: MetadataValue },
    Gte { key: String, value: MetadataValue },
    Lt { key: String, value: MetadataValue },
    Lte { key: String, value: MetadataValue },
    In { key: String, values: Vec<MetadataValue> },
    Nin { key: String, values: Vec<MetadataValue> },
    And {
        left: Box<FilterExpression>,
        right: Box<FilterExpression>,
    },
    Or {
        left: Box<FilterExpression>,
        right: Box<FilterExpression>,
    },
    Not { expr: Box<FilterExpression> },
}

impl FilterExpression {
    pub fn eq<K: Into<String>, V: Into<MetadataValue>>(key: K, value: V) -> Self {
        FilterExpression::Eq {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn ne<K: Into<String>, V: Into<MetadataValue>>(key: K, value: V) -> Self {
        FilterExpression::Ne {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn gt<K: Into<String>, V: Into<MetadataValue>>(key: K, value: V) -> Self {
        FilterExpression::Gt {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn gte<K: Into<String>, V: Into<MetadataValue>>(key: K, value: V) -> Self {
        FilterExpression::Gte {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn lt<K: Into<String>, V: Into<MetadataValue>>(key: K, value: V) -> Self {
        FilterExpression::Lt {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn lte<K: Into<String>, V: Into<MetadataValue>>(key: K, value: V) -> Self {
        FilterExpression::Lte {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn is_in<K, I, V>(key: K, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<MetadataValue>,
    {
        FilterExpression::In {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn not_in<K, I, V>(key: K, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<MetadataValue>,
    {
        FilterExpression::Nin {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn and(self, other: FilterExpression) -> Self {
        FilterExpression::And {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn or(self, other: FilterExpression) -> Self {
        FilterExpression::Or {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn negate(self) -> Self {
        FilterExpression::Not {
            expr: Box::new(self),
        }
    }

    /// Evaluate the expression against `metadata`.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            FilterExpression::Eq { key, value } => metadata
                .get(key)
                .is_some_and(|actual| values_equal(actual, value)),
            FilterExpression::Ne { key, value } => !metadata
                .get(key)
                .is_some_and(|actual| values_equal(actual, value)),
            FilterExpression::Gt { key, value } => {
                ordering(metadata, key, value) == Some(Ordering::Greater)
            }
            FilterExpression::Gte { key, value } => matches!(
                ordering(metadata, key, value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterExpression::Lt { key, value } => {
                ordering(metadata, key, value) == Some(Ordering::Less)
            }
            FilterExpression::Lte { key, value } => matches!(
                ordering(metadata, key, value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterExpression::In { key, values } => contains(metadata, key, values),
            FilterExpression::Nin { key, values } => !contains(metadata, key, values),
            FilterExpression::And { left, right } => left.matches(metadata) && right.matches(metadata),
            FilterExpression::Or { left, right } => left.matches(metadata) || right.matches(metadata),
            FilterExpression::Not { expr } => !expr.matches(metadata),
        }
    }

    /// Structural checks: keys are non-empty, set operators carry at least one value.
    pub fn validate(&self) -> Result<(), DocumentError> {
        match self {
            FilterExpression::Eq { key, .. }
            | FilterExpression::Ne { key, .. }
            | FilterExpression::Gt { key, .. }
            | FilterExpression::Gte { key, .. }
            | FilterExpression::Lt { key, .. }
            | FilterExpression::Lte { key, .. } => validate_key(key),
            FilterExpression::In { key, values } | FilterExpression::Nin { key, values } => {
                validate_key(key)?;
                if values.is_empty() {
                    return Err(DocumentError::invalid(format!(
                        "filter on '{key}' needs at least one value"
                    )));
                }
                Ok(())
            }
            FilterExpression::And { left, right } | FilterExpression::Or { left, right } => {
                left.validate()?;
                right.validate()
            }
            FilterExpression::Not { expr } => expr.validate(),
        }
    }
}

fn validate_key(key: &str) -> Result<(), DocumentError> {
    if key.trim().is_empty() {
        return Err(DocumentError::invalid("filter key must not be empty"));
    }
    Ok(())
}

fn compare(actual: &MetadataValue, expected: &MetadataValue) -> Option<Ordering> {
    match (actual, expected) {
        (MetadataValue::String(a), MetadataValue::String(b)) => Some(a.cmp(b)),
        (MetadataValue::Bool(a), MetadataValue::Bool(b)) => Some(a.cmp(b)),
        (MetadataValue::Integer(a), MetadataValue::Integer(b)) => Some(a.cmp(b)),
        _ => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    }
}

fn values_equal(actual: &MetadataValue, expected: &MetadataValue) -> bool {
    compare(actual, expected) == Some(Ordering::Equal)
}

fn ordering(metadata: &Metadata, key: &str, expected: &MetadataValue) -> Option<Ordering> {
    metadata.get(key).and_then(|actual| compare(actual, expected))
}

fn contains(metadata: &Metadata, key: &str, values: &[MetadataValue]) -> bool {
    metadata
        .get(key)
        .is_some_and(|actual| values.iter().any(|v| values_equal(actual, v)))
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[MetadataValue]) -> fmt::Result {
    f.write_str("[")?;
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_str("]")
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpression::Eq { key, value } => write!(f, "{key} == {value}"),
            FilterExpression::Ne { key, value } => write!(f, "{key} != {value}"),
            FilterExpression::Gt { key, value } => write!(f, "{key} > {value}"),
            FilterExpression::Gte { key, value } => write!(f, "{key} >= {value}"),
            FilterExpression::Lt { key, value } => write!(f, "{key} < {value}"),
            FilterExpression::Lte { key, value } => write!(f, "{key} <= {value}"),
            FilterExpression::In { key, values } => {
                write!(f, "{key} IN ")?;
                write_list(f, values)
            }
            FilterExpression::Nin { key, values } => {
                write!(f, "{key} NOT IN ")?;
                write_list(f, values)
            }
            FilterExpression::And { left, right } => write!(f, "({left} && {right})"),
            FilterExpression::Or { left, right } => write!(f, "({left} || {right})"),
            FilterExpression::Not { expr } => write!(f, "NOT {expr}"),
        }
    }
}
