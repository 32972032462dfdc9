//! Provider payload -> [`Usage`].

use serde_json::Value;

use crate::error::UsageError;
use crate::raw::{RawCompletionTokenDetails, RawPromptTokensDetails, RawUsage};
use crate::types::{CompletionTokenDetails, PromptTokensDetails, Usage};

/// Fill every absent counter with zero.
///
/// A provider-reported `total_tokens` is kept as is even when it disagrees
/// with `prompt + completion`; only a missing total is computed.
pub fn normalize(raw: &RawUsage) -> Usage {
    let prompt_tokens = raw.prompt_tokens.unwrap_or(0);
    let generation_tokens = raw.completion_tokens.unwrap_or(0);
    let total_tokens = raw
        .total_tokens
        .unwrap_or_else(|| prompt_tokens.saturating_add(generation_tokens));

    Usage {
        prompt_tokens,
        generation_tokens,
        total_tokens,
        prompt_tokens_details: raw
            .prompt_tokens_details
            .as_ref()
            .map(normalize_prompt_details)
            .unwrap_or_default(),
        completion_token_details: raw
            .completion_tokens_details
            .as_ref()
            .map(normalize_completion_details)
            .unwrap_or_default(),
    }
}

/// Normalize the `usage` member of a provider JSON response.
///
/// `null` means the provider reported nothing and yields [`Usage::empty`].
pub fn normalize_value(value: &Value) -> Result<Usage, UsageError> {
    match value {
        Value::Null => Ok(Usage::empty()),
        Value::Object(_) => {
            let raw: RawUsage = serde_json::from_value(value.clone())
                .map_err(|err| UsageError::MalformedResponse(err.to_string()))?;
            Ok(normalize(&raw))
        }
        other => Err(UsageError::MalformedResponse(format!(
            "expected usage object, found {}",
            kind_of(other)
        ))),
    }
}

impl From<&RawUsage> for Usage {
    fn from(raw: &RawUsage) -> Self {
        normalize(raw)
    }
}

impl From<RawUsage> for Usage {
    fn from(raw: RawUsage) -> Self {
        normalize(&raw)
    }
}

fn normalize_prompt_details(raw: &RawPromptTokensDetails) -> PromptTokensDetails {
    PromptTokensDetails {
        audio_tokens: raw.audio_tokens.unwrap_or(0),
        cached_tokens: raw.cached_tokens.unwrap_or(0),
    }
}

fn normalize_completion_details(raw: &RawCompletionTokenDetails) -> CompletionTokenDetails {
    CompletionTokenDetails {
        reasoning_tokens: raw.reasoning_tokens.unwrap_or(0),
        accepted_prediction_tokens: raw.accepted_prediction_tokens.unwrap_or(0),
        audio_tokens: raw.audio_tokens.unwrap_or(0),
        rejected_prediction_tokens: raw.rejected_prediction_tokens.unwrap_or(0),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
