//! BotConfig: BaseConfig + LLM + store + dispatcher settings. Use load() for env-based loading.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use conversation_store::{RedisTarget, StoreConfig};
use dbot_core::env_or;
use llm_client::{EnvLlmConfig, LlmConfig};
use tracing::debug;

use super::BaseConfig;
use crate::dispatcher::DispatcherSettings;

const DEFAULT_QUEUE_IDLE_SECS: u64 = 300;

/// Values given on the command line; each wins over its environment variable.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub token: Option<String>,
    pub openai_api_key: Option<String>,
    pub redis_url: Option<String>,
    /// dotenv-format file loaded before reading the environment.
    pub config_file: Option<PathBuf>,
}

/// Bot config. Use BotConfig::load() for env-based loading.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub base: BaseConfig,
    pub llm: EnvLlmConfig,
    pub store: StoreConfig,
    /// DISPATCH_QUEUE_IDLE_SECS
    pub queue_idle_secs: u64,
}

impl BotConfig {
    /// Load full config. The optional config file is read first; variables already set in the
    /// environment are not overwritten by it. CLI overrides win over both.
    /// Call validate() after load to check config before init.
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        if let Some(path) = overrides.config_file.as_ref() {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
            debug!(path = %path.display(), "Loaded config file");
        }

        let base = BaseConfig::load(overrides.token)?;
        let llm = EnvLlmConfig::from_env_with_api_key(overrides.openai_api_key)?;
        let mut store = StoreConfig::from_env()?;
        if let Some(url) = overrides.redis_url {
            store.redis = RedisTarget::Url(url);
        }
        let queue_idle_secs = env_or("DISPATCH_QUEUE_IDLE_SECS", DEFAULT_QUEUE_IDLE_SECS)?;

        Ok(Self {
            base,
            llm,
            store,
            queue_idle_secs,
        })
    }

    /// Validate config. Call after load() to fail fast before init.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        self.llm.validate()?;
        self.store.validate()?;
        if self.queue_idle_secs == 0 {
            anyhow::bail!("DISPATCH_QUEUE_IDLE_SECS must be greater than 0");
        }
        Ok(())
    }

    pub fn bot_token(&self) -> &str {
        &self.base.bot_token
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn telegram_api_url(&self) -> Option<&str> {
        self.base.telegram_api_url.as_deref()
    }

    pub fn dispatcher_settings(&self) -> DispatcherSettings {
        DispatcherSettings {
            model: self.llm.model().to_string(),
            allowed_models: self.llm.allowed_models().to_vec(),
            temperature: self.llm.temperature(),
            max_tokens: self.llm.max_tokens(),
            context_token_limit: self.llm.context_token_limit(),
            request_timeout: self.llm.request_timeout(),
            system_prompt: self.llm.system_prompt().map(str::to_string),
            queue_idle_timeout: Duration::from_secs(self.queue_idle_secs),
        }
    }
}
