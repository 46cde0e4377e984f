//! Outbound reply transport.
//!
//! [`Bot`] is transport-agnostic; the teloxide implementation lives in `gpt-bot::telegram`.
//! Tests substitute a recording mock.

use crate::error::Result;
use crate::types::{Chat, Message};
use async_trait::async_trait;

/// Abstraction for emitting replies. Implementations map to a transport (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a text message to the given chat.
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;

    /// Shows a "typing" indicator in the chat while a reply is being produced. No-op by default.
    async fn send_typing(&self, _chat: &Chat) -> Result<()> {
        Ok(())
    }

    /// Replies to the given message (same chat).
    async fn reply_to(&self, message: &Message, text: &str) -> Result<()> {
        self.send_message(&message.chat, text).await
    }
}
