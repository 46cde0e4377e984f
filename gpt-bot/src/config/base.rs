//! Base config: Telegram Bot connection and logging. Loaded from env.

use std::env;

use anyhow::{bail, Context, Result};

pub const DEFAULT_LOG_FILE: &str = "logs/gpt-bot.log";

/// Base config: Telegram-related and logging only.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// BOT_TOKEN or TELEGRAM_TOKEN
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// Log file path
    pub log_file: String,
}

impl BaseConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = token
            .or_else(|| env::var("BOT_TOKEN").ok())
            .or_else(|| env::var("TELEGRAM_TOKEN").ok())
            .filter(|s| !s.trim().is_empty())
            .context("BOT_TOKEN (or TELEGRAM_TOKEN) not set")?;
        let log_file = env::var("LOG_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok()
            .filter(|s| !s.trim().is_empty());

        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
        })
    }

    /// A custom API URL must parse and use http(s).
    pub fn validate(&self) -> Result<()> {
        let Some(url_str) = self.telegram_api_url.as_deref() else {
            return Ok(());
        };
        let url = reqwest::Url::parse(url_str).with_context(|| {
            format!("TELEGRAM_API_URL (or TELOXIDE_API_URL) is not a valid URL: {}", url_str)
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("TELEGRAM_API_URL must use http or https, got {}", url.scheme());
        }
        Ok(())
    }
}
