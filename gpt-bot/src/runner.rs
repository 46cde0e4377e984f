use anyhow::{Context, Result};
use dbot_core::init_tracing;
use tracing::{info, instrument};

use crate::components::{build_bot_components, build_handler_chain};
use crate::config::BotConfig;
use crate::telegram::run_dispatcher;

/// Main entry: validate config, init logging, build components, then run the Telegram dispatcher.
/// Returns an error when the bot stopped because it became non-serving.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file()).context("Failed to initialise logging")?;

    info!(
        model = %config.llm.llm_model,
        store = ?config.store.backend,
        max_turns = config.store.max_turns,
        "Initializing bot"
    );

    let components = build_bot_components(&config, None, None, None)?;
    let handler_chain = build_handler_chain(&components);

    run_dispatcher(
        components.teloxide_bot.clone(),
        handler_chain,
        components.bot_username.clone(),
        components.serving.clone(),
    )
    .await
}
