use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::raw::{RawCompletionTokenDetails, RawPromptTokensDetails, RawUsage};

/// Fully populated token usage. Absent provider counters are already zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub generation_tokens: u64,
    pub total_tokens: u64,
    pub prompt_tokens_details: PromptTokensDetails,
    pub completion_token_details: CompletionTokenDetails,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptTokensDetails {
    pub audio_tokens: u64,
    pub cached_tokens: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionTokenDetails {
    pub reasoning_tokens: u64,
    pub accepted_prediction_tokens: u64,
    pub audio_tokens: u64,
    pub rejected_prediction_tokens: u64,
}

impl Usage {
    /// Usage with no detail breakdown; the total is the sum of both counters.
    pub fn new(prompt_tokens: u64, generation_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            generation_tokens,
            total_tokens: prompt_tokens.saturating_add(generation_tokens),
            ..Self::default()
        }
    }

    /// All counters zero.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Raw form with every field present. Normalizing it returns `self` unchanged.
    pub fn to_raw(&self) -> RawUsage {
        RawUsage {
            prompt_tokens: Some(self.prompt_tokens),
            completion_tokens: Some(self.generation_tokens),
            total_tokens: Some(self.total_tokens),
            prompt_tokens_details: Some(RawPromptTokensDetails {
                audio_tokens: Some(self.prompt_tokens_details.audio_tokens),
                cached_tokens: Some(self.prompt_tokens_details.cached_tokens),
            }),
            completion_tokens_details: Some(RawCompletionTokenDetails {
                reasoning_tokens: Some(self.completion_token_details.reasoning_tokens),
                accepted_prediction_tokens: Some(
                    self.completion_token_details.accepted_prediction_tokens,
                ),
                audio_tokens: Some(self.completion_token_details.audio_tokens),
                rejected_prediction_tokens: Some(
                    self.completion_token_details.rejected_prediction_tokens,
                ),
            }),
        }
    }
}

impl Add for PromptTokensDetails {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            audio_tokens: self.audio_tokens.saturating_add(other.audio_tokens),
            cached_tokens: self.cached_tokens.saturating_add(other.cached_tokens),
        }
    }
}

impl Add for CompletionTokenDetails {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            reasoning_tokens: self.reasoning_tokens.saturating_add(other.reasoning_tokens),
            accepted_prediction_tokens: self
                .accepted_prediction_tokens
                .saturating_add(other.accepted_prediction_tokens),
            audio_tokens: self.audio_tokens.saturating_add(other.audio_tokens),
            rejected_prediction_tokens: self
                .rejected_prediction_tokens
                .saturating_add(other.rejected_prediction_tokens),
        }
    }
}

impl Add for Usage {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens.saturating_add(other.prompt_tokens),
            generation_tokens: self.generation_tokens.saturating_add(other.generation_tokens),
            total_tokens: self.total_tokens.saturating_add(other.total_tokens),
            prompt_tokens_details: self.prompt_tokens_details + other.prompt_tokens_details,
            completion_token_details: self.completion_token_details
                + other.completion_token_details,
        }
    }
}

impl Sum for Usage {
    fn sum<I: Iterator<Item = Usage>>(iter: I) -> Self {
        iter.fold(Usage::empty(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sums_total() {
        let usage = Usage::new(10, 5);
        assert_eq!(usage.total_tokens, 15);
        assert_eq!(usage.prompt_tokens_details, PromptTokensDetails::default());
    }

    #[test]
    fn empty_is_all_zero() {
        assert!(Usage::empty().is_empty());
        assert!(!Usage::new(1, 0).is_empty());
    }

    #[test]
    fn add_accumulates_details() {
        let mut a = Usage::new(3, 4);
        a.prompt_tokens_details.cached_tokens = 2;
        a.completion_token_details.reasoning_tokens = 1;
        let mut b = Usage::new(1, 1);
        b.prompt_tokens_details.cached_tokens = 5;

        let sum = a + b;
        assert_eq!(sum.prompt_tokens, 4);
        assert_eq!(sum.generation_tokens, 5);
        assert_eq!(sum.total_tokens, 9);
        assert_eq!(sum.prompt_tokens_details.cached_tokens, 7);
        assert_eq!(sum.completion_token_details.reasoning_tokens, 1);
    }

    #[test]
    fn sum_over_iterator() {
        let total: Usage = vec![Usage::new(1, 1), Usage::new(2, 2), Usage::new(3, 0)]
            .into_iter()
            .sum();
        assert_eq!(total, Usage::new(6, 3));
    }

    #[test]
    fn add_saturates_instead_of_overflowing() {
        let big = Usage::new(u64::MAX, 0);
        let sum = big + Usage::new(1, 0);
        assert_eq!(sum.prompt_tokens, u64::MAX);
    }

    #[test]
    fn to_raw_is_fully_populated() {
        let raw = Usage::new(2, 3).to_raw();
        assert_eq!(raw.prompt_tokens, Some(2));
        assert_eq!(raw.completion_tokens, Some(3));
        assert_eq!(raw.total_tokens, Some(5));
        assert!(raw.prompt_tokens_details.is_some());
        assert!(raw.completion_tokens_details.is_some());
    }
}
