//! CLI parser and config loading.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{BotConfig, ConfigOverrides};

#[derive(Parser)]
#[command(name = "gpt-bot")]
#[command(about = "Telegram bot backed by an OpenAI-compatible chat completion API", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram bot (config from env; flags override env values).
    Run {
        /// Telegram bot token (overrides BOT_TOKEN).
        #[arg(short, long)]
        token: Option<String>,
        /// OpenAI API key (overrides OPENAI_API_KEY).
        #[arg(long)]
        openai_api_key: Option<String>,
        /// Redis URL (overrides REDIS_URL and REDIS_HOST/PORT/DB/PASSWORD).
        #[arg(long)]
        redis_url: Option<String>,
        /// dotenv-format config file; variables already in the environment win.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Load BotConfig from the environment, an optional config file and CLI overrides.
pub fn load_config(
    token: Option<String>,
    openai_api_key: Option<String>,
    redis_url: Option<String>,
    config_file: Option<PathBuf>,
) -> Result<BotConfig> {
    BotConfig::load(ConfigOverrides {
        token,
        openai_api_key,
        redis_url,
        config_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_flags() {
        let cli = Cli::try_parse_from([
            "gpt-bot",
            "run",
            "--token",
            "t",
            "--openai-api-key",
            "k",
            "--redis-url",
            "redis://r:6379/0",
            "--config",
            "bot.env",
        ])
        .unwrap();
        let Commands::Run {
            token,
            openai_api_key,
            redis_url,
            config,
        } = cli.command;
        assert_eq!(token.as_deref(), Some("t"));
        assert_eq!(openai_api_key.as_deref(), Some("k"));
        assert_eq!(redis_url.as_deref(), Some("redis://r:6379/0"));
        assert_eq!(config, Some(PathBuf::from("bot.env")));
    }

    #[test]
    fn run_without_flags() {
        let cli = Cli::try_parse_from(["gpt-bot", "run"]).unwrap();
        let Commands::Run { token, config, .. } = cli.command;
        assert!(token.is_none());
        assert!(config.is_none());
    }
}
