//! Telegram layer: teloxide ⇄ core conversions, Bot implementation, dispatcher loop.

mod adapters;
mod bot_adapter;
mod runner;

pub use adapters::{TelegramMessageWrapper, TelegramUserWrapper};
pub use bot_adapter::TelegramBotAdapter;
pub use runner::run_dispatcher;
