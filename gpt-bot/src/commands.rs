//! Bot commands: `/start`, `/help`, `/state`, `/model`, `/reset`. Runs before the dispatcher in the chain.
//!
//! Unknown commands fall through to the dispatcher as ordinary text. Commands addressed to another
//! bot (`/cmd@otherbot`) are ignored.

use std::sync::Arc;

use async_trait::async_trait;
use dbot_core::{Bot, Handler, HandlerResponse, Message, Result};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::dispatcher::Dispatcher;
use crate::replies::{
    model_menu_text, model_unknown_text, state_text, MSG_HELP, MSG_WELCOME,
};
use crate::stats::CompletionStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    State,
    Model,
    Reset,
}

/// Result of parsing a message as a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedCommand {
    /// A command for this bot.
    Known(Command),
    /// A `/command` addressed to a different bot.
    ForOtherBot,
    /// Plain text or a command this bot does not know.
    NotACommand,
}

/// Parses the first word of `text`. `bot_username` is compared case-insensitively to `@mention`.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> ParsedCommand {
    let Some(first) = text.split_whitespace().next() else {
        return ParsedCommand::NotACommand;
    };
    let Some(body) = first.strip_prefix('/') else {
        return ParsedCommand::NotACommand;
    };
    let (name, target) = match body.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (body, None),
    };
    if let Some(target) = target {
        let ours = bot_username
            .map(|u| u.trim_start_matches('@').eq_ignore_ascii_case(target))
            .unwrap_or(false);
        if !ours {
            return ParsedCommand::ForOtherBot;
        }
    }
    match name.to_ascii_lowercase().as_str() {
        "start" => ParsedCommand::Known(Command::Start),
        "help" => ParsedCommand::Known(Command::Help),
        "state" => ParsedCommand::Known(Command::State),
        "model" => ParsedCommand::Known(Command::Model),
        "reset" => ParsedCommand::Known(Command::Reset),
        _ => ParsedCommand::NotACommand,
    }
}

/// Text after the command word, if any.
pub fn command_argument(text: &str) -> Option<&str> {
    let rest = text.trim_start();
    let (_, arg) = rest.split_once(char::is_whitespace)?;
    let arg = arg.trim();
    (!arg.is_empty()).then_some(arg)
}

pub struct CommandHandler {
    bot: Arc<dyn Bot>,
    dispatcher: Dispatcher,
    stats: Arc<CompletionStats>,
    bot_username: Arc<RwLock<Option<String>>>,
}

impl CommandHandler {
    pub fn new(
        bot: Arc<dyn Bot>,
        dispatcher: Dispatcher,
        stats: Arc<CompletionStats>,
        bot_username: Arc<RwLock<Option<String>>>,
    ) -> Self {
        Self {
            bot,
            dispatcher,
            stats,
            bot_username,
        }
    }

    async fn reply(&self, message: &Message, text: String) -> Result<HandlerResponse> {
        self.bot.reply_to(message, &text).await?;
        Ok(HandlerResponse::Reply(text))
    }

    /// `/model` shows the menu; `/model <name>` queues the switch behind pending messages.
    async fn model(&self, message: &Message) -> Result<HandlerResponse> {
        let models = self.dispatcher.models();
        let Some(requested) = command_argument(&message.content) else {
            let current = models.current(&message.conversation_id());
            return self.reply(message, model_menu_text(&current, models.allowed())).await;
        };
        match models.find(requested) {
            Some(model) => {
                self.dispatcher.enqueue_model_switch(message, model)?;
                Ok(HandlerResponse::Stop)
            }
            None => {
                let text = model_unknown_text(requested, models.allowed());
                self.reply(message, text).await
            }
        }
    }
}

#[async_trait]
impl Handler for CommandHandler {
    #[instrument(skip(self, message))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let bot_username = self.bot_username.read().await.clone();
        let command = match parse_command(&message.content, bot_username.as_deref()) {
            ParsedCommand::Known(command) => command,
            ParsedCommand::ForOtherBot => return Ok(HandlerResponse::Stop),
            ParsedCommand::NotACommand => return Ok(HandlerResponse::Continue),
        };

        info!(
            user_id = message.user.id,
            chat_id = message.chat.id,
            command = ?command,
            "Command received"
        );

        match command {
            Command::Start => self.reply(message, MSG_WELCOME.to_string()).await,
            Command::Help => self.reply(message, MSG_HELP.to_string()).await,
            Command::State => {
                let text = state_text(self.stats.stability_percent(), self.stats.total());
                self.reply(message, text).await
            }
            Command::Model => self.model(message).await,
            Command::Reset => {
                self.dispatcher.enqueue_reset(message)?;
                Ok(HandlerResponse::Stop)
            }
        }
    }
}
