//! Core types: user, chat, inbound message, handler response, and Handler trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sender identity (id, username, names).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Chat (private or group) identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
    pub chat_type: String,
}

/// An inbound text message: the transport event the bot reacts to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user: User,
    pub chat: Chat,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Stable key grouping messages into one conversation: the chat id.
    pub fn conversation_id(&self) -> String {
        self.chat.id.to_string()
    }

    /// Short human-readable sender label for logs (`@username` or `id`).
    pub fn sender_label(&self) -> String {
        match &self.user.username {
            Some(name) => format!("@{} ({})", name, self.user.id),
            None => self.user.id.to_string(),
        }
    }
}

/// Handler result for the chain. `Reply(text)` carries the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Pass to next handler.
    Continue,
    /// Stop the chain; the handler has taken responsibility for the message.
    Stop,
    /// Stop the chain and attach the reply text that was sent.
    Reply(String),
}

/// Converts a transport-specific user type to core [`User`].
pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

/// Converts a transport-specific message type to core [`Message`].
pub trait ToCoreMessage: Send + Sync {
    fn to_core(&self) -> Message;
}

/// One step of the handler chain. The chain stops at the first `Stop` or `Reply`.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, message: &Message) -> crate::error::Result<HandlerResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(chat_id: i64, username: Option<&str>) -> Message {
        Message {
            id: "1".to_string(),
            user: User {
                id: 7,
                username: username.map(String::from),
                first_name: None,
                last_name: None,
            },
            chat: Chat {
                id: chat_id,
                chat_type: "private".to_string(),
            },
            content: "hi".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn conversation_id_is_chat_id() {
        assert_eq!(message(42, None).conversation_id(), "42");
        assert_eq!(message(-100123, None).conversation_id(), "-100123");
    }

    #[test]
    fn sender_label_prefers_username() {
        assert_eq!(message(1, Some("alice")).sender_label(), "@alice (7)");
        assert_eq!(message(1, None).sender_label(), "7");
    }
}
