use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;
use usage::{normalize_value, Usage};

use crate::normalize::l2_normalize_in_place;
use crate::{EmbeddingConfig, EmbeddingError, EmbeddingModel, EmbeddingResponse};

// Shared client with connection pooling; timeouts are applied per request.
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(32)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// OpenAI-compatible embedding endpoint (`POST {"input": [...], "model": ...}`).
///
/// The vector length is taken from the configuration when set, otherwise it is
/// learned from the first successful response and enforced afterwards.
#[derive(Debug)]
pub struct ApiEmbeddingModel {
    url: String,
    auth_header: Option<String>,
    model_name: String,
    timeout: Duration,
    normalize: bool,
    // 0 = not known yet
    dimensions: AtomicUsize,
}

impl ApiEmbeddingModel {
    pub fn from_config(cfg: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        cfg.validate()?;
        let url = cfg
            .api_url
            .clone()
            .ok_or_else(|| EmbeddingError::InvalidConfig("api_url is required for api mode".into()))?;
        Ok(Self {
            url,
            auth_header: cfg.api_auth_header.clone(),
            model_name: cfg.model_name.clone(),
            timeout: Duration::from_secs(cfg.api_timeout_secs),
            normalize: cfg.normalize,
            dimensions: AtomicUsize::new(cfg.dimensions.unwrap_or(0)),
        })
    }

    fn learn_dimensions(&self, vectors: &[Vec<f32>]) -> Result<(), EmbeddingError> {
        let Some(first) = vectors.first() else {
            return Ok(());
        };
        let len = first.len();
        if len == 0 {
            return Err(EmbeddingError::MalformedResponse(
                "provider returned an empty embedding".into(),
            ));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != len) {
            return Err(EmbeddingError::MalformedResponse(format!(
                "inconsistent embedding lengths in one response: {len} and {}",
                bad.len()
            )));
        }
        match self
            .dimensions
            .compare_exchange(0, len, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(()),
            Err(known) if known == len => Ok(()),
            Err(known) => Err(EmbeddingError::MalformedResponse(format!(
                "expected {known}-dimensional embeddings, provider returned {len}"
            ))),
        }
    }
}

#[async_trait]
impl EmbeddingModel for ApiEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> Option<usize> {
        match self.dimensions.load(Ordering::Acquire) {
            0 => None,
            n => Some(n),
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingResponse, EmbeddingError> {
        if texts.is_empty() {
            return Ok(EmbeddingResponse {
                vectors: Vec::new(),
                usage: Usage::empty(),
            });
        }

        let payload = build_api_payload(texts, &self.model_name);
        let response = send_api_request(&self.url, self.auth_header.as_deref(), self.timeout, payload)
            .await?;
        let (mut vectors, usage) = parse_api_response(response)?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::MalformedResponse(format!(
                "requested {} embeddings, provider returned {}",
                texts.len(),
                vectors.len()
            )));
        }
        self.learn_dimensions(&vectors)?;
        if self.normalize {
            vectors.iter_mut().for_each(|v| l2_normalize_in_place(v));
        }

        debug!(
            model = %self.model_name,
            inputs = texts.len(),
            prompt_tokens = usage.prompt_tokens,
            total_tokens = usage.total_tokens,
            "embedding_api_response"
        );
        Ok(EmbeddingResponse { vectors, usage })
    }
}

fn build_api_payload(texts: &[String], model_name: &str) -> Value {
    json!({ "input": texts, "model": model_name })
}

async fn send_api_request(
    url: &str,
    auth_header: Option<&str>,
    timeout: Duration,
    payload: Value,
) -> Result<Value, EmbeddingError> {
    let mut request = HTTP_CLIENT
        .post(url)
        .timeout(timeout)
        .header("Content-Type", "application/json");
    if let Some(header) = auth_header {
        request = request.header("Authorization", header);
    }

    let response = request
        .json(&payload)
        .send()
        .await
        .map_err(|e| EmbeddingError::Request(format!("HTTP request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        // 400/422 mean the provider understood the request and refused the input.
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(EmbeddingError::Failure(format!(
                "provider rejected input ({status}): {}",
                provider_error_message(&body)
            )));
        }
        return Err(EmbeddingError::Request(format!("HTTP error {status}: {body}")));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| EmbeddingError::MalformedResponse(format!("invalid JSON response: {e}")))
}

/// Split an OpenAI-style response into ordered vectors and normalized usage.
fn parse_api_response(value: Value) -> Result<(Vec<Vec<f32>>, Usage), EmbeddingError> {
    let Value::Object(mut map) = value else {
        return Err(EmbeddingError::MalformedResponse(
            "expected a JSON object".into(),
        ));
    };

    if let Some(error) = map.get("error").filter(|e| !e.is_null()) {
        return Err(EmbeddingError::Failure(error_text(error)));
    }

    let usage = normalize_value(map.get("usage").unwrap_or(&Value::Null))?;

    let items = match map.remove("data") {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(EmbeddingError::MalformedResponse(
                "`data` must be an array".into(),
            ))
        }
        None => {
            return Err(EmbeddingError::MalformedResponse(
                "missing `data` array".into(),
            ))
        }
    };

    let mut indexed = Vec::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        let Value::Object(mut obj) = item else {
            return Err(EmbeddingError::MalformedResponse(
                "unexpected entry inside `data` array".into(),
            ));
        };
        let index = obj
            .get("index")
            .and_then(Value::as_u64)
            .map_or(position, |i| i as usize);
        let embedding = obj.remove("embedding").ok_or_else(|| {
            EmbeddingError::MalformedResponse("missing `embedding` field in data item".into())
        })?;
        indexed.push((index, parse_embedding_vector(embedding)?));
    }
    // Providers may return items out of order; `index` refers to the input position.
    indexed.sort_by_key(|(index, _)| *index);

    Ok((indexed.into_iter().map(|(_, v)| v).collect(), usage))
}

/// `{"error": {"message": ..}}` or a bare string, as OpenAI-style providers send it.
fn error_text(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map_or_else(|| error.to_string(), str::to_string)
}

fn provider_error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value.get("error").map_or_else(|| body.to_string(), error_text),
        Err(_) => body.to_string(),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, EmbeddingError> {
    let Value::Array(values) = value else {
        return Err(EmbeddingError::MalformedResponse(
            "embedding must be an array of numbers".into(),
        ));
    };
    values
        .into_iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .filter(|f| f.is_finite())
                .ok_or_else(|| {
                    EmbeddingError::MalformedResponse(format!(
                        "embedding component is not a finite number: {v}"
                    ))
                })
        })
        .collect()
}
