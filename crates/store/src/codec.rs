//! On-disk row format for persistent backends: bincode, then zstd.

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use document::{Document, Metadata};
use serde::{Deserialize, Serialize};
use zstd::{decode_all, encode_all};

use crate::config::{CompressionCodec, CompressionConfig};
use crate::VectorStoreError;

/// Bump whenever the `StoredDocument` layout changes.
pub(crate) const ROW_SCHEMA_VERSION: u16 = 1;

// Metadata values are an untagged enum, which bincode cannot decode on its
// own; they travel as JSON bytes inside the row.
mod metadata_serde {
    use document::Metadata;
    use serde::de::Error as DeError;
    use serde::ser::Error as SerError;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Metadata, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = serde_json::to_vec(value).map_err(SerError::custom)?;
        serializer.serialize_bytes(&bytes)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        serde_json::from_slice(&bytes).map_err(DeError::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredDocument {
    schema_version: u16,
    id: String,
    content: String,
    #[serde(with = "metadata_serde")]
    metadata: Metadata,
    embedding: Vec<f32>,
}

impl StoredDocument {
    /// Row for an embedded document. Documents without a vector are rejected.
    pub(crate) fn from_document(doc: &Document) -> Result<Self, VectorStoreError> {
        let embedding = doc.embedding().ok_or_else(|| {
            VectorStoreError::invalid(format!("document '{}' has no embedding", doc.id()))
        })?;
        Ok(Self {
            schema_version: ROW_SCHEMA_VERSION,
            id: doc.id().to_string(),
            content: doc.content().to_string(),
            metadata: doc.metadata().clone(),
            embedding: embedding.to_vec(),
        })
    }

    pub(crate) fn into_document(self) -> Result<Document, VectorStoreError> {
        if self.schema_version != ROW_SCHEMA_VERSION {
            return Err(VectorStoreError::MalformedResponse(format!(
                "row '{}' has schema version {}, expected {ROW_SCHEMA_VERSION}",
                self.id, self.schema_version
            )));
        }
        Document::builder(self.content)
            .id(self.id)
            .metadata_map(self.metadata)
            .embedding(self.embedding)
            .build()
            .map_err(|e| VectorStoreError::MalformedResponse(e.to_string()))
    }
}

impl CompressionConfig {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, VectorStoreError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => {
                encode_all(data, self.level).map_err(|e| VectorStoreError::backend(format!("zstd: {e}")))
            }
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, VectorStoreError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => decode_all(data)
                .map_err(|e| VectorStoreError::MalformedResponse(format!("zstd: {e}"))),
        }
    }
}

pub(crate) fn encode_row(
    row: &StoredDocument,
    compression: &CompressionConfig,
) -> Result<Vec<u8>, VectorStoreError> {
    let encoded = encode_to_vec(row, standard())?;
    compression.compress(&encoded)
}

pub(crate) fn decode_row(
    data: &[u8],
    compression: &CompressionConfig,
) -> Result<StoredDocument, VectorStoreError> {
    let decompressed = compression.decompress(data)?;
    let (row, _) = decode_from_slice(&decompressed, standard())?;
    Ok(row)
}
