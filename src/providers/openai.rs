use anyhow::Result;
use reqwest::blocking::Client; // we are using blocking API here to make sync calls
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{
    base::{Provider, Usage},
    configs::base::ProviderConfig,
    configs::openai::OpenAiProviderConfig,
    types::message::Message,
    utils::{
        messages_to_openai_spec, openai_error_to_provider_error, openai_response_to_message,
        openai_response_to_usage,
    },
};
use crate::errors::ProviderError;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn post(&self, api_key: &str, payload: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&payload)
            .send()?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(response.json()?);
        }

        let body = response.text().unwrap_or_default();
        match serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("error").cloned())
        {
            Some(error) => Err(openai_error_to_provider_error(&error).into()),
            None => Err(ProviderError::Request { status, body }.into()),
        }
    }
}

impl Provider for OpenAiProvider {
    fn from_env() -> Result<Self> {
        let config = OpenAiProviderConfig::from_env()?;
        Self::new(config)
    }

    fn complete(
        &self,
        model: &str,
        messages: &[Message],
        api_key: Option<&str>,
    ) -> Result<(Message, Usage)> {
        let api_key = api_key
            .or(self.config.api_key.as_deref())
            .ok_or(ProviderError::MissingApiKey)?;

        let payload = json!({
            "model": model,
            "messages": messages_to_openai_spec(messages),
        });

        debug!(model, messages = messages.len(), "requesting completion");
        let response = self.post(api_key, payload)?;

        if let Some(error) = response.get("error") {
            return Err(openai_error_to_provider_error(error).into());
        }

        let message = openai_response_to_message(&response)?;
        let usage = openai_response_to_usage(&response);

        Ok((message, usage))
    }
}
