use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::types::message::Message;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }

    /// Fold another call's usage into this running total.
    pub fn add(&mut self, other: &Usage) {
        fn sum(a: Option<i32>, b: Option<i32>) -> Option<i32> {
            match (a, b) {
                (Some(a), Some(b)) => Some(a.saturating_add(b)),
                (a, b) => a.or(b),
            }
        }
        self.input_tokens = sum(self.input_tokens, other.input_tokens);
        self.output_tokens = sum(self.output_tokens, other.output_tokens);
        self.total_tokens = sum(self.total_tokens, other.total_tokens);
    }
}

/// A remote text-generation endpoint.
///
/// Given the ordered conversation and a model identifier, produce exactly one
/// assistant message. The credential is supplied per call; implementations
/// fall back to their own configured key when it is `None`.
pub trait Provider: Send + Sync {
    /// Create a provider instance from environment variables
    fn from_env() -> Result<Self>
    where
        Self: Sized;

    fn complete(
        &self,
        model: &str,
        messages: &[Message],
        api_key: Option<&str>,
    ) -> Result<(Message, Usage)>;
}
