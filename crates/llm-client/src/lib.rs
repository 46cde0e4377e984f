//! # Completion client
//!
//! Defines the [`CompletionClient`] trait, the OpenAI HTTP implementation
//! ([`OpenAiCompletionClient`]) and the retry wrapper ([`RetryingClient`]). Transport-agnostic;
//! used by the bot's dispatcher.
//!
//! One [`CompletionClient::complete`] call is one network call. Retries, backoff and the
//! per-attempt timeout live in [`RetryingClient`], driven by an explicit [`RetryPolicy`].

use std::time::Duration;

use async_trait::async_trait;
use prompt::ChatMessage;

mod config;
mod error;
mod openai;
mod retry;

pub use config::{EnvLlmConfig, LlmConfig};
pub use error::CompletionError;
pub use openai::OpenAiCompletionClient;
pub use retry::{RetryPolicy, RetryingClient};

/// Everything one completion call needs. Built per call, never persisted.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Role-tagged messages in prompt order (system, history, new user turn).
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

/// Produces a text continuation for a prompt.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the generated text, or why it could not be produced.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// Masks an API key/token for safe logging: shows first 7 chars + "***" + last 4 chars.
/// If length <= 11, returns "***" to avoid leaking any part of the key.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_char_boundary(7) || !token.is_char_boundary(len - 4) {
        return "***".to_string();
    }
    format!("{}***{}", &token[..7], &token[len - 4..])
}
