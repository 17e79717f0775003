use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use crate::providers::base::{Provider, Usage};
use crate::providers::types::message::Message;

/// Everything needed to (re)build an agent, kept apart from its live history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub name: String,
    pub model: String,
    pub system_message: Option<String>,
    /// Falls back to the provider's own key when `None`.
    pub api_key: Option<String>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            system_message: None,
            api_key: None,
        }
    }

    pub fn with_system_message(mut self, system_message: Option<&str>) -> Self {
        self.system_message = system_message.map(str::to_string);
        self
    }

    pub fn with_api_key(mut self, api_key: Option<&str>) -> Self {
        self.api_key = api_key.map(str::to_string);
        self
    }
}

/// A named conversation with a text-generation model.
pub struct Agent {
    config: AgentConfig,
    provider: Arc<dyn Provider>,
    history: Vec<Message>,
    usage: Usage,
}

impl Agent {
    pub fn new(config: AgentConfig, provider: Arc<dyn Provider>) -> Self {
        let mut agent = Self {
            config,
            provider,
            history: Vec::new(),
            usage: Usage::default(),
        };
        agent.reset();
        agent
    }

    /// Clear the conversation and start over with a new model, system message and key.
    ///
    /// An empty system message leaves the history empty.
    pub fn start_chat(&mut self, model: &str, system_message: Option<&str>, api_key: Option<&str>) {
        self.config.model = model.to_string();
        self.config.system_message = system_message.map(str::to_string);
        self.config.api_key = api_key.map(str::to_string);
        self.reset();
    }

    fn reset(&mut self) {
        self.history.clear();
        if let Some(system) = self
            .config
            .system_message
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            self.history.push(Message::system(system));
        }
    }

    /// Append `messages` to the history and ask the model for the next reply.
    ///
    /// The whole history is sent. The reply is recorded as an assistant message.
    pub fn send(&mut self, messages: &[Message]) -> Result<String> {
        self.history.extend_from_slice(messages);

        let (reply, usage) = self.provider.complete(
            &self.config.model,
            &self.history,
            self.config.api_key.as_deref(),
        )?;
        debug!(
            agent = %self.config.name,
            history = self.history.len(),
            total_tokens = ?usage.total_tokens,
            "received reply"
        );
        self.usage.add(&usage);

        let text = reply.content.clone();
        self.history.push(reply);
        Ok(text)
    }

    pub fn chat(&mut self, text: &str) -> Result<String> {
        self.send(&[Message::user(text)])
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Content of the leading system message, if the history was seeded with one.
    pub fn system_message(&self) -> Option<&str> {
        self.history
            .first()
            .filter(|m| m.is_system())
            .map(Message::text)
    }

    pub fn usage(&self) -> &Usage {
        &self.usage
    }
}
