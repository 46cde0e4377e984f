//! # dbot-core
//!
//! Core types and traits for the bot: the inbound [`Message`] event, [`Handler`], the outbound
//! [`Bot`] transport, errors, and tracing initialization. Transport-agnostic; the Telegram
//! specifics live in the `gpt-bot` crate.

pub mod bot;
pub mod env;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::Bot;
pub use env::{env_non_empty, env_or};
pub use error::{DbotError, HandlerError, Result};
pub use logger::init_tracing;
pub use types::{Chat, Handler, HandlerResponse, Message, ToCoreMessage, ToCoreUser, User};
