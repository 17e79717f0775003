use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

use crate::agent::{Agent, AgentConfig};
use crate::debate::{DebateOptions, RollingWindow};
use crate::prompts::{
    conclusion_prompt, format_turn, seed_system_message, MODERATOR_NAME, MODERATOR_SYSTEM_MESSAGE,
};
use crate::providers::base::Provider;
use crate::providers::types::message::Message;

/// Settings replacing the moderator's own when it is rebuilt for a conclusion.
#[derive(Debug, Clone, Default)]
pub struct ModeratorOverrides {
    pub model: Option<String>,
    pub system_message: Option<String>,
    pub api_key: Option<String>,
}

impl ModeratorOverrides {
    fn apply(self, mut config: AgentConfig) -> AgentConfig {
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(system_message) = self.system_message {
            config.system_message = Some(system_message);
        }
        if let Some(api_key) = self.api_key {
            config.api_key = Some(api_key);
        }
        config
    }
}

/// A panel of agents that debate a question, plus the moderator that concludes it.
pub struct Group {
    provider: Arc<dyn Provider>,
    moderator: Agent,
    members: Vec<Agent>,
}

impl Group {
    pub fn new(provider: Arc<dyn Provider>, moderator: AgentConfig) -> Self {
        Self {
            moderator: Agent::new(moderator, provider.clone()),
            provider,
            members: Vec::new(),
        }
    }

    /// Build a group of `number` identical members named `bot_0`, `bot_1`, ...
    pub fn create_bots(
        provider: Arc<dyn Provider>,
        number: usize,
        model: &str,
        system_message: Option<&str>,
        moderator_system_message: Option<&str>,
        api_key: Option<&str>,
    ) -> Self {
        let moderator = AgentConfig::new(MODERATOR_NAME, model)
            .with_system_message(Some(
                moderator_system_message.unwrap_or(MODERATOR_SYSTEM_MESSAGE),
            ))
            .with_api_key(api_key);

        let mut group = Self::new(provider, moderator);
        for i in 0..number {
            group.add_bot(
                AgentConfig::new(format!("bot_{}", i), model)
                    .with_system_message(system_message)
                    .with_api_key(api_key),
            );
        }
        group
    }

    pub fn add_bot(&mut self, config: AgentConfig) {
        self.members.push(Agent::new(config, self.provider.clone()));
    }

    pub fn members(&self) -> &[Agent] {
        &self.members
    }

    pub fn moderator(&self) -> &Agent {
        &self.moderator
    }

    /// Restart every member with its current system message extended by the
    /// shared one and the question under debate.
    pub fn init_bots(&mut self, question: &str, system_message: Option<&str>) {
        for bot in &mut self.members {
            let config = bot.config().clone();
            let seeded =
                seed_system_message(config.system_message.as_deref(), system_message, question);
            bot.start_chat(&config.model, Some(&seeded), config.api_key.as_deref());
        }
    }

    /// Run the debate and return the transcript: the question followed by
    /// every member's turn, in order.
    pub fn launch_debate(
        &mut self,
        question: &str,
        system_message: Option<&str>,
        options: &DebateOptions,
    ) -> Result<Vec<Message>> {
        self.init_bots(question, system_message);

        let seed = Message::user(question);
        let mut window = RollingWindow::new(seed.clone());
        let mut transcript = vec![seed];
        let members = self.members.len();

        for iteration in 0..options.iterations {
            let bound = options.bound_for(iteration, members);
            for bot in &mut self.members {
                window.fit(bound);
                let reply = bot.send(&window.to_vec())?;

                let turn = Message::user(format_turn(bot.name(), &reply));
                if options.verbose {
                    info!(iteration, "{}", turn.content);
                } else {
                    debug!(iteration, "{}", turn.content);
                }
                window.push(turn.clone());
                transcript.push(turn);
            }
        }

        Ok(transcript)
    }

    /// Ask the moderator for a conclusion on `question` given the debate `messages`.
    ///
    /// With `remove_cache` the moderator is rebuilt from its configuration
    /// (plus `overrides`) and starts with a clean history; otherwise the
    /// existing moderator is reused as is and `overrides` are ignored.
    pub fn get_conclusion(
        &mut self,
        question: &str,
        mut messages: Vec<Message>,
        overrides: ModeratorOverrides,
        remove_cache: bool,
    ) -> Result<String> {
        if remove_cache {
            let config = overrides.apply(self.moderator.config().clone());
            self.moderator = Agent::new(config, self.provider.clone());
        }

        messages.push(Message::user(conclusion_prompt(question)));
        let conclusion = self.moderator.send(&messages)?;
        info!(moderator = %self.moderator.name(), "conclusion reached");
        Ok(conclusion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;
    use crate::providers::types::message::Role;

    fn group_with(number: usize, responses: Vec<&str>) -> (Group, Arc<MockProvider>) {
        let provider = Arc::new(MockProvider::new(responses));
        let group = Group::create_bots(
            provider.clone(),
            number,
            "gpt-3.5-turbo",
            Some("It is an example."),
            Some("You are the moderator"),
            Some("test_key"),
        );
        (group, provider)
    }

    #[test]
    fn test_create_bots() {
        let (group, _) = group_with(3, vec![]);
        assert_eq!(group.members().len(), 3);
        for (i, bot) in group.members().iter().enumerate() {
            assert_eq!(bot.name(), format!("bot_{}", i));
            assert_eq!(bot.system_message(), Some("It is an example."));
            assert_eq!(bot.config().api_key.as_deref(), Some("test_key"));
        }
        assert_eq!(group.moderator().name(), MODERATOR_NAME);
        assert_eq!(group.moderator().system_message(), Some("You are the moderator"));
    }

    #[test]
    fn test_moderator_default_system_message() {
        let provider = Arc::new(MockProvider::new(Vec::<String>::new()));
        let group = Group::create_bots(provider, 1, "gpt-3.5-turbo", None, None, None);
        assert_eq!(group.moderator().system_message(), Some(MODERATOR_SYSTEM_MESSAGE));
        assert_eq!(group.members()[0].system_message(), None);
    }

    #[test]
    fn test_groups_do_not_share_members() {
        let (mut first, _) = group_with(1, vec![]);
        let (second, _) = group_with(2, vec![]);
        first.add_bot(AgentConfig::new("extra", "gpt-3.5-turbo"));
        assert_eq!(first.members().len(), 2);
        assert_eq!(second.members().len(), 2);
    }

    #[test]
    fn test_init_bots() {
        let cases = [
            (
                Some("You are a test"),
                "It is an example. You are a test Is this a test?",
            ),
            (None, "It is an example. Is this a test?"),
        ];
        for (system_message, expected) in cases {
            let (mut group, _) = group_with(3, vec![]);
            group.init_bots("Is this a test?", system_message);
            for bot in group.members() {
                assert_eq!(bot.history().len(), 1);
                assert_eq!(bot.history()[0].role, Role::System);
                assert_eq!(bot.system_message(), Some(expected));
            }
        }
    }

    #[test]
    fn test_second_debate_extends_seeded_message() -> Result<()> {
        let (mut group, _) = group_with(1, vec!["first", "second"]);
        let options = DebateOptions {
            iterations: 1,
            ..DebateOptions::default()
        };
        group.launch_debate("Q", Some("Y"), &options)?;
        group.launch_debate("Q", Some("Y"), &options)?;

        let bot = &group.members()[0];
        assert_eq!(
            bot.config().system_message.as_deref(),
            Some("It is an example. Y Q Y Q")
        );
        assert_eq!(bot.system_message(), bot.config().system_message.as_deref());
        Ok(())
    }

    #[test]
    fn test_launch_debate() -> Result<()> {
        let (mut group, _) = group_with(2, vec!["R0", "R1", "R0", "R1"]);
        let options = DebateOptions {
            iterations: 2,
            ..DebateOptions::default()
        };

        let transcript = group.launch_debate("Is this a test?", None, &options)?;
        let texts: Vec<&str> = transcript.iter().map(Message::text).collect();
        assert_eq!(
            texts,
            [
                "Is this a test?",
                "Assistant bot_0: R0",
                "Assistant bot_1: R1",
                "Assistant bot_0: R0",
                "Assistant bot_1: R1",
            ]
        );
        assert!(transcript.iter().all(|m| m.role == Role::User));
        Ok(())
    }

    #[test]
    fn test_launch_debate_without_members() -> Result<()> {
        let (mut group, provider) = group_with(0, vec![]);
        let transcript = group.launch_debate("Q", None, &DebateOptions::default())?;
        assert_eq!(transcript.len(), 1);
        assert!(provider.calls().is_empty());
        Ok(())
    }

    #[test]
    fn test_debate_aborts_on_failure() {
        // three turns are needed, only two replies are available
        let (mut group, provider) = group_with(3, vec!["a", "b"]);
        let options = DebateOptions {
            iterations: 1,
            ..DebateOptions::default()
        };
        assert!(group.launch_debate("Q", None, &options).is_err());
        assert_eq!(provider.calls().len(), 3);
    }

    #[test]
    fn test_get_conclusion_rebuilds_moderator() -> Result<()> {
        let (mut group, provider) = group_with(1, vec!["warm up", "conclusion"]);
        group.moderator.chat("warm up")?;
        assert_eq!(group.moderator().history().len(), 3);

        let messages = vec![Message::user("Q"), Message::user("Assistant bot_0: R0")];
        let conclusion = group.get_conclusion("Q", messages, ModeratorOverrides::default(), true)?;
        assert_eq!(conclusion, "conclusion");

        // system message only, then the two debate messages and the question
        let call = &provider.calls()[1];
        assert_eq!(call.messages.len(), 4);
        assert_eq!(call.messages[0].role, Role::System);
        assert!(call.messages[3].text().contains("Q"));
        assert_eq!(group.moderator().history().len(), 5);
        Ok(())
    }

    #[test]
    fn test_get_conclusion_reuses_moderator() -> Result<()> {
        let (mut group, provider) = group_with(1, vec!["warm up", "conclusion"]);
        group.moderator.chat("warm up")?;

        let overrides = ModeratorOverrides {
            model: Some("gpt-4o".to_string()),
            ..ModeratorOverrides::default()
        };
        group.get_conclusion("Q", vec![Message::user("Q")], overrides, false)?;

        let call = &provider.calls()[1];
        // system, warm up, reply, Q, conclusion prompt
        assert_eq!(call.messages.len(), 5);
        assert_eq!(call.model, "gpt-3.5-turbo");
        assert_eq!(group.moderator().history().len(), 6);
        Ok(())
    }

    #[test]
    fn test_get_conclusion_applies_overrides() -> Result<()> {
        let (mut group, provider) = group_with(1, vec!["conclusion"]);
        let overrides = ModeratorOverrides {
            model: Some("gpt-4o".to_string()),
            system_message: Some("Be brief".to_string()),
            api_key: Some("other_key".to_string()),
        };
        group.get_conclusion("Q", Vec::new(), overrides, true)?;

        let call = &provider.calls()[0];
        assert_eq!(call.model, "gpt-4o");
        assert_eq!(call.api_key.as_deref(), Some("other_key"));
        assert_eq!(call.messages[0].text(), "Be brief");
        assert_eq!(group.moderator().name(), MODERATOR_NAME);
        Ok(())
    }
}
