//! # Handler chain
//!
//! Runs handlers in registration order until one of them takes the message (`Stop` or `Reply`).
//! A handler error ends the chain and is returned to the caller.

use dbot_core::{Handler, HandlerResponse, Message, Result};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Ordered list of handlers; the first `Stop`/`Reply` wins.
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    pub fn add_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Offers the message to each handler in order. Returns the deciding response, or `Continue`
    /// when no handler took it.
    #[instrument(skip(self, message), fields(chat_id = message.chat.id, message_id = %message.id))]
    pub async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        for h in &self.handlers {
            let name = std::any::type_name_of_val(h.as_ref());
            let response = h.handle(message).await?;
            debug!(handler = %name, response = ?response, "step: handler done");

            match response {
                HandlerResponse::Continue => {}
                HandlerResponse::Stop | HandlerResponse::Reply(_) => {
                    info!(
                        user_id = message.user.id,
                        handler = %name,
                        "step: handler chain stopped by handler"
                    );
                    return Ok(response);
                }
            }
        }

        debug!(user_id = message.user.id, "step: no handler took the message");
        Ok(HandlerResponse::Continue)
    }
}
