//! # gpt-bot
//!
//! Telegram bot that answers every text message with a chat completion, keeping a bounded
//! per-chat history as context. Wires dbot-core, handler-chain, prompt, llm-client and
//! conversation-store; loads config from env / `.env` / CLI and runs the teloxide dispatcher.

pub mod cli;
pub mod commands;
pub mod components;
pub mod config;
pub mod dispatcher;
pub mod models;
pub mod replies;
pub mod runner;
pub mod serving;
pub mod stats;
pub mod telegram;

pub use cli::{load_config, Cli, Commands};
pub use commands::{command_argument, parse_command, Command, CommandHandler, ParsedCommand};
pub use components::{build_bot_components, build_handler_chain, BotComponents};
pub use config::{BaseConfig, BotConfig, ConfigOverrides};
pub use dispatcher::{Dispatcher, DispatcherSettings};
pub use models::ModelSelection;
pub use runner::run_bot;
pub use serving::ServingState;
pub use stats::CompletionStats;
