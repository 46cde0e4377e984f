//! LLM configuration: trait and env-based implementation.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dbot_core::{env_non_empty, env_or};

/// Models offered by `/model` when ALLOWED_MODELS is unset.
pub const DEFAULT_ALLOWED_MODELS: &[&str] = &["gpt-3.5-turbo", "gpt-4o"];

use crate::RetryPolicy;

/// LLM configuration interface for OpenAI-compatible APIs.
pub trait LlmConfig: Send + Sync {
    fn api_key(&self) -> &str;
    fn base_url(&self) -> &str;
    fn model(&self) -> &str;
    /// Models a conversation may switch to; always contains [`model`](Self::model).
    fn allowed_models(&self) -> &[String];
    fn temperature(&self) -> f32;
    fn max_tokens(&self) -> u32;
    fn context_token_limit(&self) -> usize;
    fn request_timeout(&self) -> Duration;
    fn retry_policy(&self) -> RetryPolicy;
    fn system_prompt(&self) -> Option<&str>;
}

/// LLM config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub llm_model: String,
    pub allowed_models: Vec<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub context_token_limit: usize,
    pub request_timeout_secs: u64,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub llm_system_prompt: Option<String>,
}

impl LlmConfig for EnvLlmConfig {
    fn api_key(&self) -> &str {
        &self.openai_api_key
    }
    fn base_url(&self) -> &str {
        &self.openai_base_url
    }
    fn model(&self) -> &str {
        &self.llm_model
    }
    fn allowed_models(&self) -> &[String] {
        &self.allowed_models
    }
    fn temperature(&self) -> f32 {
        self.temperature
    }
    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
    fn context_token_limit(&self) -> usize {
        self.context_token_limit
    }
    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            ..RetryPolicy::default()
        }
    }
    fn system_prompt(&self) -> Option<&str> {
        self.llm_system_prompt.as_deref()
    }
}

impl EnvLlmConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_api_key(None)
    }

    /// Like [`from_env`](Self::from_env); `api_key` overrides OPENAI_API_KEY if provided.
    pub fn from_env_with_api_key(api_key: Option<String>) -> Result<Self> {
        let openai_api_key = api_key
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .filter(|s| !s.trim().is_empty())
            .context("OPENAI_API_KEY not set")?;
        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let llm_model = env_non_empty("MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string());
        let allowed_models = parse_model_list(
            &llm_model,
            env_non_empty("ALLOWED_MODELS").as_deref(),
        );
        let llm_system_prompt = env::var("LLM_SYSTEM_PROMPT")
            .or_else(|_| env::var("SYSTEM_PROMPT"))
            .ok()
            .filter(|s| !s.trim().is_empty());
        Ok(Self {
            openai_api_key,
            openai_base_url,
            llm_model,
            allowed_models,
            temperature: env_or("TEMPERATURE", 0.7)?,
            max_tokens: env_or("MAX_TOKENS", 512)?,
            context_token_limit: env_or("CONTEXT_TOKEN_LIMIT", 4096)?,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 60)?,
            retry_max_attempts: env_or("RETRY_MAX_ATTEMPTS", 3)?,
            retry_base_delay_ms: env_or("RETRY_BASE_DELAY_MS", 500)?,
            retry_max_delay_ms: env_or("RETRY_MAX_DELAY_MS", 8000)?,
            llm_system_prompt,
        })
    }

    /// Rejects values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.openai_api_key.trim().is_empty() {
            bail!("OPENAI_API_KEY must not be empty");
        }
        if !self.allowed_models.contains(&self.llm_model) {
            bail!("MODEL {} is missing from the allowed models", self.llm_model);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            bail!("TEMPERATURE must be between 0 and 2, got {}", self.temperature);
        }
        if self.max_tokens == 0 {
            bail!("MAX_TOKENS must be greater than 0");
        }
        if self.context_token_limit <= self.max_tokens as usize {
            bail!(
                "CONTEXT_TOKEN_LIMIT ({}) must be greater than MAX_TOKENS ({})",
                self.context_token_limit,
                self.max_tokens
            );
        }
        if self.request_timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be greater than 0");
        }
        if self.retry_max_attempts == 0 {
            bail!("RETRY_MAX_ATTEMPTS must be at least 1");
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            bail!("RETRY_BASE_DELAY_MS must not exceed RETRY_MAX_DELAY_MS");
        }
        Ok(())
    }
}

/// Comma-separated list with the default model first, duplicates and blanks removed.
fn parse_model_list(default_model: &str, raw: Option<&str>) -> Vec<String> {
    let listed: Vec<&str> = match raw {
        Some(raw) => raw.split(',').map(str::trim).collect(),
        None => DEFAULT_ALLOWED_MODELS.to_vec(),
    };
    let mut models = vec![default_model.to_string()];
    for model in listed {
        if !model.is_empty() && !models.iter().any(|m| m == model) {
            models.push(model.to_string());
        }
    }
    models
}
