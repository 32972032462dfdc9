//! Token usage normalization.
//!
//! Providers report token accounting with any subset of fields present.
//! [`normalize`] turns a [`RawUsage`] into a [`Usage`] with every counter
//! populated, so callers never branch on absence:
//!
//! ```
//! use usage::{normalize, RawUsage};
//!
//! let raw = RawUsage {
//!     prompt_tokens: Some(10),
//!     completion_tokens: Some(5),
//!     ..RawUsage::default()
//! };
//! let usage = normalize(&raw);
//! assert_eq!(usage.total_tokens, 15);
//! assert_eq!(usage.prompt_tokens_details.cached_tokens, 0);
//! ```

mod error;
mod normalize;
mod raw;
mod types;

pub use crate::error::UsageError;
pub use crate::normalize::{normalize, normalize_value};
pub use crate::raw::{RawCompletionTokenDetails, RawPromptTokensDetails, RawUsage};
pub use crate::types::{CompletionTokenDetails, PromptTokensDetails, Usage};
