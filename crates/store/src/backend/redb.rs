//! Persistent store on redb, a pure-Rust embedded ACID key-value database.
//!
//! Rows are keyed by document id inside one table per store; the table name
//! is reported as the collection name. Values are bincode-encoded and, by
//! default, zstd-compressed. redb transactions block, so every one of them
//! runs on `tokio::task::spawn_blocking`.
//!
//! ```yaml
//! store:
//!   backend: redb
//!   path: "/data/vectorscope.redb"
//!   table: "documents"
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use document::{Document, SearchRequest};
use embedding::EmbeddingModel;
use redb::{Database, ReadableTable, TableDefinition};
use tracing::{debug, info};

use crate::codec::{decode_row, encode_row, StoredDocument};
use crate::config::CompressionConfig;
use crate::descriptor::{BackendDescriptor, SimilarityMetric};
use crate::embed::{check_ids, check_supplied_dimensions, embed_missing, embed_query};
use crate::ranking::rank;
use crate::{VectorStore, VectorStoreError};

/// Identifier reported as `db.system`.
pub const REDB_DATABASE_SYSTEM: &str = "redb";

/// Table used when none is configured.
pub const DEFAULT_TABLE: &str = "documents";

fn table_def(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

pub struct RedbVectorStore {
    db: Arc<Database>,
    table: Arc<str>,
    embedding: Arc<dyn EmbeddingModel>,
    compression: CompressionConfig,
    metric: SimilarityMetric,
}

impl RedbVectorStore {
    /// Open or create the database at `path` and make sure `table` exists.
    pub fn open<P: AsRef<Path>>(
        path: P,
        table_name: &str,
        embedding: Arc<dyn EmbeddingModel>,
    ) -> Result<Self, VectorStoreError> {
        if table_name.is_empty() {
            return Err(VectorStoreError::invalid("redb table name must not be empty"));
        }
        let db = Database::create(path).map_err(VectorStoreError::backend)?;

        // Opening the table inside a write transaction creates it.
        let write_txn = db.begin_write().map_err(VectorStoreError::backend)?;
        {
            let _table = write_txn
                .open_table(table_def(table_name))
                .map_err(VectorStoreError::backend)?;
        }
        write_txn.commit().map_err(VectorStoreError::backend)?;

        Ok(Self {
            db: Arc::new(db),
            table: Arc::from(table_name),
            embedding,
            compression: CompressionConfig::default(),
            metric: SimilarityMetric::Cosine,
        })
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Number of stored rows.
    pub async fn len(&self) -> Result<usize, VectorStoreError> {
        let db = Arc::clone(&self.db);
        let name = Arc::clone(&self.table);
        tokio::task::spawn_blocking(move || -> Result<usize, VectorStoreError> {
            let read_txn = db.begin_read().map_err(VectorStoreError::backend)?;
            let table = read_txn
                .open_table(table_def(&name))
                .map_err(VectorStoreError::backend)?;
            let count = table.len().map_err(VectorStoreError::backend)?;
            Ok(count as usize)
        })
        .await?
    }

    /// Stored copy of `id`, including its embedding.
    pub async fn get(&self, id: &str) -> Result<Option<Document>, VectorStoreError> {
        let db = Arc::clone(&self.db);
        let name = Arc::clone(&self.table);
        let compression = self.compression;
        let id = id.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<Document>, VectorStoreError> {
            let read_txn = db.begin_read().map_err(VectorStoreError::backend)?;
            let table = read_txn
                .open_table(table_def(&name))
                .map_err(VectorStoreError::backend)?;
            // Decode while the access guard is alive; it must drop before `table`.
            let document = match table.get(id.as_str()).map_err(VectorStoreError::backend)? {
                Some(value) => Some(decode_row(value.value(), &compression)?.into_document()?),
                None => None,
            };
            Ok(document)
        })
        .await?
    }
}

#[async_trait]
impl VectorStore for RedbVectorStore {
    fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor::new(REDB_DATABASE_SYSTEM, self.metric)
            .with_collection_name(self.table.to_string())
            .with_dimensions(self.embedding.dimensions())
    }

    async fn add(&self, documents: Vec<Document>) -> Result<(), VectorStoreError> {
        check_supplied_dimensions(self.embedding.as_ref(), &documents)?;
        let started = Instant::now();
        let (documents, usage) = embed_missing(self.embedding.as_ref(), documents).await?;

        let entries = documents
            .iter()
            .map(|doc| {
                let row = StoredDocument::from_document(doc)?;
                Ok((doc.id().to_string(), encode_row(&row, &self.compression)?))
            })
            .collect::<Result<Vec<(String, Vec<u8>)>, VectorStoreError>>()?;
        let count = entries.len();

        let db = Arc::clone(&self.db);
        let name = Arc::clone(&self.table);
        tokio::task::spawn_blocking(move || {
            let write_txn = db.begin_write().map_err(VectorStoreError::backend)?;
            {
                let mut table = write_txn
                    .open_table(table_def(&name))
                    .map_err(VectorStoreError::backend)?;
                for (key, value) in &entries {
                    table
                        .insert(key.as_str(), value.as_slice())
                        .map_err(VectorStoreError::backend)?;
                }
            }
            write_txn.commit().map_err(VectorStoreError::backend)
        })
        .await??;

        info!(
            db_system = REDB_DATABASE_SYSTEM,
            table = %self.table,
            documents = count,
            prompt_tokens = usage.prompt_tokens,
            total_tokens = usage.total_tokens,
            elapsed_micros = started.elapsed().as_micros() as u64,
            "vector_store_add_success"
        );
        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<(), VectorStoreError> {
        check_ids(ids)?;
        let db = Arc::clone(&self.db);
        let name = Arc::clone(&self.table);
        let ids = ids.to_vec();
        let requested = ids.len();
        let removed = tokio::task::spawn_blocking(move || {
            let write_txn = db.begin_write().map_err(VectorStoreError::backend)?;
            let mut removed = 0usize;
            {
                let mut table = write_txn
                    .open_table(table_def(&name))
                    .map_err(VectorStoreError::backend)?;
                for id in &ids {
                    if table
                        .remove(id.as_str())
                        .map_err(VectorStoreError::backend)?
                        .is_some()
                    {
                        removed += 1;
                    }
                }
            }
            write_txn.commit().map_err(VectorStoreError::backend)?;
            Ok::<_, VectorStoreError>(removed)
        })
        .await??;

        debug!(
            db_system = REDB_DATABASE_SYSTEM,
            table = %self.table,
            requested,
            removed,
            "vector_store_delete_success"
        );
        Ok(())
    }

    async fn similarity_search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<Document>, VectorStoreError> {
        let started = Instant::now();
        let (query, usage) = embed_query(self.embedding.as_ref(), request.query_text()).await?;

        let db = Arc::clone(&self.db);
        let name = Arc::clone(&self.table);
        let compression = self.compression;
        let metric = self.metric;
        let owned_request = request.clone();
        let hits = tokio::task::spawn_blocking(move || {
            let read_txn = db.begin_read().map_err(VectorStoreError::backend)?;
            let table = read_txn
                .open_table(table_def(&name))
                .map_err(VectorStoreError::backend)?;

            let mut candidates = Vec::new();
            for item in table.iter().map_err(VectorStoreError::backend)? {
                let (_, value) = item.map_err(VectorStoreError::backend)?;
                candidates.push(decode_row(value.value(), &compression)?.into_document()?);
            }
            Ok::<_, VectorStoreError>(rank(&candidates, &query, &owned_request, metric))
        })
        .await??;

        debug!(
            db_system = REDB_DATABASE_SYSTEM,
            table = %self.table,
            top_k = request.top_k(),
            hits = hits.len(),
            prompt_tokens = usage.prompt_tokens,
            elapsed_micros = started.elapsed().as_micros() as u64,
            "vector_store_query_success"
        );
        Ok(hits)
    }
}
