//! Vectorscope document model
//!
//! Value types shared by every vector store in the workspace:
//!
//! - [`Document`] - stored content, caller metadata, optional embedding, and the
//!   similarity score attached to search hits.
//! - [`SearchRequest`] - query text, `top_k`, similarity threshold, optional filter.
//! - [`FilterExpression`] - boolean expression over metadata, evaluated in-process.
//!
//! Everything here validates at construction and is immutable afterwards. A
//! store receiving one of these values can assume the invariants hold; the only
//! error this crate produces, [`DocumentError::InvalidArgument`], is raised
//! before any store is involved.
//!
//! ## Example
//!
//! ```
//! use document::{Document, FilterExpression, SearchRequest};
//!
//! let doc = Document::builder("Great Depression caused mass unemployment")
//!     .id("a")
//!     .metadata("meta2", "meta2")
//!     .build()
//!     .unwrap();
//! assert_eq!(doc.id(), "a");
//!
//! let request = SearchRequest::builder("What is Great Depression")
//!     .top_k(1)
//!     .similarity_threshold_all()
//!     .filter(FilterExpression::eq("meta2", "meta2"))
//!     .build()
//!     .unwrap();
//! assert!(request.filter().unwrap().matches(doc.metadata()));
//!
//! assert!(SearchRequest::builder("q").top_k(0).build().is_err());
//! ```

mod error;
mod filter;
mod request;
mod types;

pub use crate::error::DocumentError;
pub use crate::filter::FilterExpression;
pub use crate::request::{
    SearchRequest, SearchRequestBuilder, DEFAULT_TOP_K, SIMILARITY_THRESHOLD_ACCEPT_ALL,
};
pub use crate::types::{
    derive_document_id, Document, DocumentBuilder, Metadata, MetadataValue, DOCUMENT_ID_NAMESPACE,
};
