//! Similarity search request.
//!
//! A [`SearchRequest`] is validated when it is built (or deserialized), so a
//! store never sees `top_k == 0` or a threshold outside `[0, 1]`.

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::filter::FilterExpression;

/// Default number of hits returned when the caller does not ask for more.
pub const DEFAULT_TOP_K: usize = 4;

/// Threshold that accepts every candidate.
pub const SIMILARITY_THRESHOLD_ACCEPT_ALL: f64 = 0.0;

/// Parameters for a nearest-neighbour query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SearchRequestFields")]
pub struct SearchRequest {
    query: String,
    top_k: usize,
    similarity_threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<FilterExpression>,
}

impl SearchRequest {
    /// Request for `query` with the defaults (`top_k = 4`, accept every similarity).
    pub fn query<S: Into<String>>(query: S) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            similarity_threshold: SIMILARITY_THRESHOLD_ACCEPT_ALL,
            filter: None,
        }
    }

    pub fn builder<S: Into<String>>(query: S) -> SearchRequestBuilder {
        SearchRequestBuilder {
            fields: SearchRequestFields {
                query: query.into(),
                top_k: DEFAULT_TOP_K,
                similarity_threshold: SIMILARITY_THRESHOLD_ACCEPT_ALL,
                filter: None,
            },
        }
    }

    pub fn query_text(&self) -> &str {
        &self.query
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    pub fn filter(&self) -> Option<&FilterExpression> {
        self.filter.as_ref()
    }

    /// Whether a hit with `score` clears this request's threshold.
    pub fn accepts(&self, score: f32) -> bool {
        f64::from(score) >= self.similarity_threshold
    }
}

/// Fluent builder; every invariant is checked in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct SearchRequestBuilder {
    fields: SearchRequestFields,
}

impl SearchRequestBuilder {
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.fields.top_k = top_k;
        self
    }

    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.fields.similarity_threshold = threshold;
        self
    }

    /// Accept every candidate regardless of similarity.
    pub fn similarity_threshold_all(self) -> Self {
        self.similarity_threshold(SIMILARITY_THRESHOLD_ACCEPT_ALL)
    }

    pub fn filter(mut self, filter: FilterExpression) -> Self {
        self.fields.filter = Some(filter);
        self
    }

    pub fn build(self) -> Result<SearchRequest, DocumentError> {
        SearchRequest::try_from(self.fields)
    }
}

/// Unvalidated wire shape, also the serde entry point.
#[derive(Debug, Clone, Deserialize)]
struct SearchRequestFields {
    query: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
    #[serde(default)]
    similarity_threshold: f64,
    #[serde(default)]
    filter: Option<FilterExpression>,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl TryFrom<SearchRequestFields> for SearchRequest {
    type Error = DocumentError;

    fn try_from(fields: SearchRequestFields) -> Result<Self, Self::Error> {
        if fields.top_k < 1 {
            return Err(DocumentError::invalid("top_k must be >= 1"));
        }
        // NaN fails the range check as well.
        if !(0.0..=1.0).contains(&fields.similarity_threshold) {
            return Err(DocumentError::invalid(format!(
                "similarity_threshold must be within [0.0, 1.0], got {}",
                fields.similarity_threshold
            )));
        }
        if let Some(ref filter) = fields.filter {
            filter.validate()?;
        }

        Ok(SearchRequest {
            query: fields.query,
            top_k: fields.top_k,
            similarity_threshold: fields.similarity_threshold,
            filter: fields.filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let req = SearchRequest::query("What is Great Depression");
        assert_eq!(req.query_text(), "What is Great Depression");
        assert_eq!(req.top_k(), DEFAULT_TOP_K);
        assert_eq!(req.similarity_threshold(), 0.0);
        assert!(req.filter().is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let req = SearchRequest::builder("q")
            .top_k(1)
            .similarity_threshold(0.75)
            .filter(FilterExpression::eq("meta2", "meta2"))
            .build()
            .expect("valid request");
        assert_eq!(req.top_k(), 1);
        assert_eq!(req.similarity_threshold(), 0.75);
        assert!(req.filter().is_some());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let err = SearchRequest::builder("q").top_k(0).build().unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        for bad in [-0.01, 1.01, f64::NAN, f64::INFINITY] {
            let result = SearchRequest::builder("q").similarity_threshold(bad).build();
            assert!(
                matches!(result, Err(DocumentError::InvalidArgument(_))),
                "threshold {bad} should be rejected"
            );
        }
    }

    #[test]
    fn boundary_thresholds_are_accepted() {
        assert!(SearchRequest::builder("q").similarity_threshold(0.0).build().is_ok());
        assert!(SearchRequest::builder("q").similarity_threshold(1.0).build().is_ok());
        let req = SearchRequest::builder("q")
            .similarity_threshold(0.9)
            .similarity_threshold_all()
            .build()
            .unwrap();
        assert_eq!(req.similarity_threshold(), 0.0);
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let result = SearchRequest::builder("q")
            .filter(FilterExpression::eq("", 1))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn accepts_compares_against_threshold() {
        let req = SearchRequest::builder("q")
            .similarity_threshold(0.5)
            .build()
            .unwrap();
        assert!(req.accepts(0.5));
        assert!(req.accepts(0.9));
        assert!(!req.accepts(0.49));
    }

    #[test]
    fn deserialization_validates() {
        let ok: SearchRequest =
            serde_json::from_str(r#"{"query":"q","top_k":2}"#).expect("valid json request");
        assert_eq!(ok.top_k(), 2);
        assert_eq!(ok.similarity_threshold(), 0.0);

        let bad = serde_json::from_str::<SearchRequest>(r#"{"query":"q","top_k":0}"#);
        assert!(bad.is_err());

        let bad = serde_json::from_str::<SearchRequest>(
            r#"{"query":"q","similarity_threshold":3.0}"#,
        );
        assert!(bad.is_err());
    }
}
