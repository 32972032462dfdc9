use serde::{Deserialize, Serialize};

/// Token accounting exactly as a provider reports it.
///
/// Every counter is optional because providers omit whatever they did not
/// measure; embedding endpoints, for example, usually report only
/// `prompt_tokens` and `total_tokens`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
    pub prompt_tokens_details: Option<RawPromptTokensDetails>,
    pub completion_tokens_details: Option<RawCompletionTokenDetails>,
}

/// Breakdown of prompt tokens, when the provider sends one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPromptTokensDetails {
    pub audio_tokens: Option<u64>,
    pub cached_tokens: Option<u64>,
}

/// Breakdown of generated tokens, when the provider sends one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCompletionTokenDetails {
    pub reasoning_tokens: Option<u64>,
    pub accepted_prediction_tokens: Option<u64>,
    pub audio_tokens: Option<u64>,
    pub rejected_prediction_tokens: Option<u64>,
}
