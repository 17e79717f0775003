use anyhow::Result;
use serde_json::{json, Value};

use super::base::Usage;
use super::types::message::Message;
use crate::errors::ProviderError;

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role,
                "content": message.content,
            })
        })
        .collect()
}

/// Convert OpenAI's API response to internal Message format
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| ProviderError::MalformedResponse("no choices in response".to_string()))?;

    let text = original
        .get("content")
        .and_then(|content| content.as_str())
        .ok_or_else(|| {
            ProviderError::MalformedResponse("response message has no text content".to_string())
        })?;

    Ok(Message::assistant(text))
}

/// Token usage as reported in the `usage` block, deriving the total when absent
pub fn openai_response_to_usage(response: &Value) -> Usage {
    let Some(usage) = response.get("usage") else {
        return Usage::default();
    };

    let count = |key: &str| usage.get(key).and_then(|v| v.as_i64()).map(|v| v as i32);

    let input_tokens = count("prompt_tokens");
    let output_tokens = count("completion_tokens");
    let total_tokens = count("total_tokens").or(match (input_tokens, output_tokens) {
        (Some(input), Some(output)) => Some(input.saturating_add(output)),
        _ => None,
    });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

/// Map the `error` object of an OpenAI response body to a provider error
pub fn openai_error_to_provider_error(error: &Value) -> ProviderError {
    if let Some(err) = check_openai_context_length_error(error) {
        return err;
    }
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    ProviderError::Api(message)
}

pub fn check_openai_context_length_error(error: &Value) -> Option<ProviderError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ProviderError::ContextLengthExceeded(message))
    } else {
        None
    }
}
