//! Dispatcher loop: converts teloxide messages to core messages and runs the handler chain for
//! each one in its own task. Stops when the process becomes non-serving.

use std::sync::Arc;

use anyhow::Result;
use dbot_core::ToCoreMessage;
use handler_chain::HandlerChain;
use teloxide::prelude::*;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use super::adapters::TelegramMessageWrapper;
use crate::serving::ServingState;

/// Calls get_me() to populate `bot_username`, then dispatches updates until Ctrl-C or until
/// `serving` is cleared.
#[instrument(skip(bot, handler_chain, bot_username, serving))]
pub async fn run_dispatcher(
    bot: teloxide::Bot,
    handler_chain: HandlerChain,
    bot_username: Arc<RwLock<Option<String>>>,
    serving: Arc<ServingState>,
) -> Result<()> {
    match bot.get_me().await {
        Ok(me) => {
            if let Some(username) = &me.user.username {
                *bot_username.write().await = Some(username.clone());
                info!(username = %username, "Bot username set");
            }
        }
        Err(e) => warn!(error = %e, "get_me failed, commands addressed by @username are ignored"),
    }

    let chain = handler_chain;
    let handler = Update::filter_message().endpoint(move |msg: teloxide::types::Message| {
        let chain = chain.clone();
        async move {
            let core_msg = TelegramMessageWrapper(&msg).to_core();

            match msg.text() {
                Some(text) => info!(
                    user_id = core_msg.user.id,
                    chat_id = core_msg.chat.id,
                    message_content = %text,
                    "Received message"
                ),
                None => {
                    info!(
                        user_id = core_msg.user.id,
                        chat_id = core_msg.chat.id,
                        "Received non-text message, ignoring"
                    );
                    return respond(());
                }
            }

            // Run handler chain in a spawned task so the dispatcher returns immediately
            tokio::spawn(async move {
                if let Err(e) = chain.handle(&core_msg).await {
                    error!(error = %e, user_id = core_msg.user.id, "Handler chain failed");
                }
            });

            respond(())
        }
    });

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build();

    let shutdown = dispatcher.shutdown_token();
    let watcher = {
        let serving = serving.clone();
        tokio::spawn(async move {
            serving.wait_not_serving().await;
            error!("Service is no longer serving, shutting down the dispatcher");
            match shutdown.shutdown() {
                Ok(done) => done.await,
                Err(e) => warn!(error = ?e, "Dispatcher was not running"),
            }
        })
    };

    info!("Bot started successfully");
    dispatcher.dispatch().await;
    watcher.abort();

    if !serving.is_serving() {
        anyhow::bail!(
            "stopped: {}",
            serving
                .reason()
                .unwrap_or_else(|| "service marked non-serving".to_string())
        );
    }
    info!("Bot stopped");
    Ok(())
}
