//! Stored content model.
//!
//! ```text
//! Document
//! ├── id: String            (caller supplied, or UUIDv5 over content + metadata)
//! ├── content: String
//! ├── metadata: Metadata    (BTreeMap<String, MetadataValue>, passed through untouched)
//! ├── embedding: Option<Vec<f32>>
//! └── score: Option<f32>    (only set on search hits)
//! ```
//!
//! Documents are immutable once built. The `with_*` helpers return new values,
//! which is how stores attach computed embeddings and similarity scores.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DocumentError;

/// Namespace for deterministic document ids.
pub const DOCUMENT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_5a2e_8d3b_4c7a_9e10_2b4f_6d8a_1c35);

/// Scalar metadata value.
///
/// Serialized untagged so JSON metadata reads naturally (`{"year": 2020}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl MetadataValue {
    /// Numeric view used by filter comparisons; integers and floats compare freely.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Integer(v) => Some(*v as f64),
            MetadataValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(v) => write!(f, "{v}"),
            MetadataValue::Integer(v) => write!(f, "{v}"),
            MetadataValue::Float(v) => write!(f, "{v:?}"),
            MetadataValue::String(v) => write!(f, "'{v}'"),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        MetadataValue::Integer(i64::from(value))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Caller-defined metadata. Ordered so id derivation and serialization are stable.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A unit of stored content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DocumentFields")]
pub struct Document {
    id: String,
    content: String,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<f32>,
}

impl Document {
    /// Document with no metadata and a derived id.
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self::with_metadata(content, Metadata::new())
    }

    /// Document with metadata and a derived id.
    pub fn with_metadata<S: Into<String>>(content: S, metadata: Metadata) -> Self {
        let content = content.into();
        let id = derive_document_id(&content, &metadata);
        Self {
            id,
            content,
            metadata,
            embedding: None,
            score: None,
        }
    }

    pub fn builder<S: Into<String>>(content: S) -> DocumentBuilder {
        DocumentBuilder {
            id: None,
            content: content.into(),
            metadata: Metadata::new(),
            embedding: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    /// Similarity to the query that produced this document, if it is a search hit.
    pub fn score(&self) -> Option<f32> {
        self.score
    }

    /// Copy of this document carrying `embedding`.
    pub fn with_embedding(&self, embedding: Vec<f32>) -> Self {
        Self {
            embedding: Some(embedding),
            ..self.clone()
        }
    }

    /// Consuming variant of [`with_embedding`](Self::with_embedding) for hot paths.
    pub fn into_embedded(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Search hit view: same document, scored, without the stored vector.
    pub fn into_hit(mut self, score: f32) -> Self {
        self.score = Some(score);
        self.embedding = None;
        self
    }
}

/// Builder for documents with explicit ids, metadata, or precomputed embeddings.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    id: Option<String>,
    content: String,
    metadata: Metadata,
    embedding: Option<Vec<f32>>,
}

impl DocumentBuilder {
    pub fn id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn metadata<K: Into<String>, V: Into<MetadataValue>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata_map(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn build(self) -> Result<Document, DocumentError> {
        let id = match self.id {
            Some(id) if id.trim().is_empty() => {
                return Err(DocumentError::invalid("document id must not be empty"));
            }
            Some(id) => id,
            None => derive_document_id(&self.content, &self.metadata),
        };

        if let Some(ref embedding) = self.embedding {
            if embedding.is_empty() {
                return Err(DocumentError::invalid(format!(
                    "document {id}: embedding must not be empty"
                )));
            }
            if embedding.iter().any(|v| !v.is_finite()) {
                return Err(DocumentError::invalid(format!(
                    "document {id}: embedding contains non-finite values"
                )));
            }
        }

        Ok(Document {
            id,
            content: self.content,
            metadata: self.metadata,
            embedding: self.embedding,
            score: None,
        })
    }
}

/// Wire shape of a [`Document`]; deserialized values pass the builder's checks.
#[derive(Deserialize)]
struct DocumentFields {
    id: String,
    content: String,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    score: Option<f32>,
}

impl TryFrom<DocumentFields> for Document {
    type Error = DocumentError;

    fn try_from(fields: DocumentFields) -> Result<Self, Self::Error> {
        if let Some(score) = fields.score {
            if !score.is_finite() {
                return Err(DocumentError::invalid(format!(
                    "document {}: score must be finite",
                    fields.id
                )));
            }
        }
        let mut document = DocumentBuilder {
            id: Some(fields.id),
            content: fields.content,
            metadata: fields.metadata,
            embedding: fields.embedding,
        }
        .build()?;
        document.score = fields.score;
        Ok(document)
    }
}

/// Deterministic id: UUIDv5 over the content and the (ordered) metadata.
///
/// Same content and metadata always yield the same id, so re-adding an unchanged
/// document overwrites instead of duplicating.
pub fn derive_document_id(content: &str, metadata: &Metadata) -> String {
    let mut material = Vec::with_capacity(content.len() + 1 + metadata.len() * 16);
    material.extend_from_slice(content.as_bytes());
    for (key, value) in metadata {
        // Separators prevent ("ab","c") colliding with ("a","bc").
        material.push(0);
        material.extend_from_slice(key.as_bytes());
        material.push(0);
        material.extend_from_slice(value.to_string().as_bytes());
    }
    Uuid::new_v5(&DOCUMENT_ID_NAMESPACE, &material).to_string()
}
