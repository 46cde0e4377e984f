//! Component factory: builds BotComponents from config. Isolates assembly logic from runner.

use std::sync::Arc;

use anyhow::Result;
use conversation_store::{create_store, ConversationStore};
use dbot_core::Bot as CoreBot;
use handler_chain::HandlerChain;
use llm_client::{mask_token, CompletionClient, LlmConfig, OpenAiCompletionClient, RetryingClient};
use teloxide::prelude::*;
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use crate::commands::CommandHandler;
use crate::config::BotConfig;
use crate::dispatcher::Dispatcher;
use crate::serving::ServingState;
use crate::stats::CompletionStats;
use crate::telegram::TelegramBotAdapter;

/// Core dependencies for run_bot; produced by the component factory.
#[derive(Clone)]
pub struct BotComponents {
    pub teloxide_bot: Bot,
    pub bot_username: Arc<RwLock<Option<String>>>,
    pub dispatcher: Dispatcher,
    pub command_handler: Arc<CommandHandler>,
    pub stats: Arc<CompletionStats>,
    pub serving: Arc<ServingState>,
}

/// Builds the teloxide Bot, honouring a custom API URL.
pub fn build_teloxide_bot(config: &BotConfig) -> Bot {
    let bot = Bot::new(config.bot_token().to_string());
    match config.telegram_api_url() {
        Some(url_str) => match reqwest::Url::parse(url_str) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        },
        None => bot,
    }
}

/// OpenAI client wrapped in the configured retry policy.
pub fn build_completion_client(config: &BotConfig) -> Arc<dyn CompletionClient> {
    let llm = &config.llm;
    info!(
        base_url = %llm.base_url(),
        model = %llm.model(),
        api_key = %mask_token(llm.api_key()),
        max_attempts = llm.retry_policy().max_attempts,
        "Using OpenAI completion client"
    );
    let openai = Arc::new(OpenAiCompletionClient::new(llm.api_key(), llm.base_url()));
    Arc::new(RetryingClient::new(openai, llm.retry_policy()))
}

/// Builds BotComponents. `bot_override` replaces the Telegram transport (tests);
/// `store` and `client` replace the configured ones when given.
#[instrument(skip_all)]
pub fn build_bot_components(
    config: &BotConfig,
    bot_override: Option<Arc<dyn CoreBot>>,
    store: Option<Arc<dyn ConversationStore>>,
    client: Option<Arc<dyn CompletionClient>>,
) -> Result<BotComponents> {
    let teloxide_bot = build_teloxide_bot(config);
    let bot: Arc<dyn CoreBot> = match bot_override {
        Some(bot) => bot,
        None => Arc::new(TelegramBotAdapter::new(teloxide_bot.clone())),
    };
    let store = match store {
        Some(store) => store,
        None => create_store(&config.store)?,
    };
    let client = client.unwrap_or_else(|| build_completion_client(config));

    let bot_username = Arc::new(RwLock::new(None));
    let stats = Arc::new(CompletionStats::new());
    let serving = Arc::new(ServingState::new());

    let dispatcher = Dispatcher::new(
        bot.clone(),
        store,
        client,
        config.dispatcher_settings(),
        stats.clone(),
        serving.clone(),
    );
    let command_handler = Arc::new(CommandHandler::new(
        bot,
        dispatcher.clone(),
        stats.clone(),
        bot_username.clone(),
    ));

    Ok(BotComponents {
        teloxide_bot,
        bot_username,
        dispatcher,
        command_handler,
        stats,
        serving,
    })
}

/// Builds the handler chain (commands → dispatcher).
pub fn build_handler_chain(components: &BotComponents) -> HandlerChain {
    HandlerChain::new()
        .add_handler(components.command_handler.clone())
        .add_handler(Arc::new(components.dispatcher.clone()))
}
