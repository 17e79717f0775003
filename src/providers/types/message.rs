use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub id: String,
    pub created: i64,
    pub content: String,
}

fn create_message_id() -> String {
    format!("msg_{}", Uuid::new_v4().simple())
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            id: create_message_id(),
            created: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or_default(),
            content: content.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::Value;

    #[test]
    fn test_user_message() {
        let user_message = Message::user("abcd");
        assert_eq!(user_message.role, Role::User);
        assert_eq!(user_message.text(), "abcd");
    }

    #[test]
    fn test_system_message() {
        let system_message = Message::system("You are a test");
        assert!(system_message.is_system());
        assert!(!Message::assistant("abcd").is_system());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let first = Message::user("a");
        let second = Message::user("a");
        assert!(first.id.starts_with("msg_"));
        assert_eq!(first.id.len(), "msg_".len() + 32);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_serialization() -> Result<()> {
        let message = Message::assistant("Hello, world!");
        let serialized = serde_json::to_string(&message)?;
        let deserialized: Message = serde_json::from_str(&serialized)?;
        assert_eq!(message.text(), deserialized.text());
        assert_eq!(deserialized.role, Role::Assistant);

        let json_value: Value = serde_json::from_str(&serialized)?;
        assert_eq!(json_value["role"], "assistant");
        assert!(json_value.get("id").is_some());
        assert!(json_value.get("created").is_some());
        Ok(())
    }
}
