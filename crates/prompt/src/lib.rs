//! # Prompt
//!
//! Turns conversation history into the message list sent to a chat completion model.
//!
//! ## Format
//!
//! Messages are role-tagged, one-to-one with the OpenAI Chat Completions `messages` array:
//! optional **system** instruction, then prior turns oldest-first (**user** / **assistant**),
//! then the new **user** turn. [`format_transcript`] renders the same list as a fixed
//! `Role: content` template for logs and diagnostics.
//!
//! ## Token budget
//!
//! [`fit_to_budget`] drops the oldest history turns until the estimated prompt size fits the
//! model context minus the completion reserve (see [`PromptBudget`]). Oversized prompts are
//! rejected by the remote API, so this is enforced before every call.

mod budget;

pub use budget::{
    estimate_message_tokens, estimate_tokens, fit_to_budget, FittedPrompt, PromptBudget,
    PromptError, MESSAGE_OVERHEAD_TOKENS,
};

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

impl MessageRole {
    /// Label used by the transcript template.
    pub fn label(self) -> &'static str {
        match self {
            MessageRole::System => "System",
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        }
    }
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Renders messages as `Role: content` lines in order, one block per message.
pub fn format_transcript(messages: &[ChatMessage]) -> String {
    let mut out = String::new();
    for msg in messages {
        out.push_str(msg.role.label());
        out.push_str(": ");
        out.push_str(&msg.content);
        out.push('\n');
    }
    out
}
