use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::Mutex;

use super::base::{Provider, Usage};
use super::types::message::Message;

/// One request seen by [`MockProvider`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub messages: Vec<Message>,
    pub api_key: Option<String>,
}

/// A mock provider that returns pre-configured responses for testing
///
/// Replies are handed out in call order, so a group of agents sharing one
/// mock receives them round-robin.
pub struct MockProvider {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl Provider for MockProvider {
    fn from_env() -> Result<Self> {
        Ok(Self::new(Vec::<String>::new()))
    }

    fn complete(
        &self,
        model: &str,
        messages: &[Message],
        api_key: Option<&str>,
    ) -> Result<(Message, Usage)> {
        self.calls
            .lock()
            .map_err(|_| anyhow!("mock provider lock poisoned"))?
            .push(RecordedCall {
                model: model.to_string(),
                messages: messages.to_vec(),
                api_key: api_key.map(str::to_string),
            });

        let reply = self
            .responses
            .lock()
            .map_err(|_| anyhow!("mock provider lock poisoned"))?
            .pop_front()
            .ok_or_else(|| anyhow!("mock provider ran out of responses"))?;

        Ok((Message::assistant(reply), Usage::new(Some(1), Some(1), Some(2))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replies_in_order_and_records_calls() -> Result<()> {
        let provider = MockProvider::new(["first", "second"]);

        let (reply, _) = provider.complete("m", &[Message::user("a")], Some("key"))?;
        assert_eq!(reply.text(), "first");
        let (reply, _) = provider.complete("m", &[Message::user("b")], None)?;
        assert_eq!(reply.text(), "second");

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].api_key.as_deref(), Some("key"));
        assert_eq!(calls[1].messages[0].text(), "b");
        Ok(())
    }

    #[test]
    fn test_exhausted_mock_fails() {
        let provider = MockProvider::new(Vec::<String>::new());
        assert!(provider.complete("m", &[], None).is_err());
    }
}
