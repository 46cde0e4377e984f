//! Bot configuration: BaseConfig (Telegram + log) + LLM, store and dispatcher settings.

mod base;
mod bot_config;


pub use base::BaseConfig;
pub use bot_config::{BotConfig, ConfigOverrides};
