//! Dispatcher: turns each inbound text message into exactly one reply.
//!
//! Messages are queued per conversation (chat id) and processed serially by one worker task per
//! conversation, so history reads and writes for a conversation never interleave. Different
//! conversations run independently.
//!
//! **Per message:** Received → HistoryLoaded → Completing → Replied, or
//! Received → HistoryLoaded → Completing → Failed → Replied (with an error text).
//!
//! **History:** after a successful completion the user turn and the assistant turn are appended
//! as one exchange, so history never holds a question without its answer. On failure nothing is
//! appended. Store failures never fail the request: a failed read
//! continues with only the new message (degraded mode), a failed write is logged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use conversation_store::{ConversationStore, Role, Turn};
use dashmap::DashMap;
use dbot_core::{Bot, Handler, HandlerError, HandlerResponse, Message, Result};
use llm_client::{CompletionClient, CompletionError, CompletionRequest};
use prompt::{fit_to_budget, format_transcript, ChatMessage, PromptBudget, PromptError};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::replies::{
    model_selected_text, MSG_BUSY, MSG_EMPTY_REPLY, MSG_FAILED, MSG_RESET_DONE, MSG_RESET_FAILED,
    MSG_TOO_LONG, MSG_UNAVAILABLE,
};
use crate::models::ModelSelection;
use crate::serving::ServingState;
use crate::stats::CompletionStats;

/// Model parameters and limits applied to every completion.
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    /// Default model; a conversation may switch to any of `allowed_models` with `/model`.
    pub model: String,
    pub allowed_models: Vec<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub context_token_limit: usize,
    pub request_timeout: Duration,
    pub system_prompt: Option<String>,
    /// An idle conversation worker exits after this long.
    pub queue_idle_timeout: Duration,
}

impl DispatcherSettings {
    fn budget(&self) -> PromptBudget {
        PromptBudget::new(self.context_token_limit, self.max_tokens as usize)
    }
}

/// Work item for a conversation's queue.
#[derive(Debug)]
enum Job {
    Chat(Message),
    Reset(Message),
    SelectModel(Message, String),
}

type QueueSender = mpsc::UnboundedSender<Job>;

struct Inner {
    bot: Arc<dyn Bot>,
    store: Arc<dyn ConversationStore>,
    client: Arc<dyn CompletionClient>,
    settings: DispatcherSettings,
    stats: Arc<CompletionStats>,
    serving: Arc<ServingState>,
    models: ModelSelection,
    queues: DashMap<String, QueueSender>,
}

/// Chain handler that schedules messages on per-conversation queues. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub fn new(
        bot: Arc<dyn Bot>,
        store: Arc<dyn ConversationStore>,
        client: Arc<dyn CompletionClient>,
        settings: DispatcherSettings,
        stats: Arc<CompletionStats>,
        serving: Arc<ServingState>,
    ) -> Self {
        let models = ModelSelection::new(settings.model.clone(), settings.allowed_models.clone());
        Self {
            inner: Arc::new(Inner {
                bot,
                store,
                client,
                settings,
                stats,
                serving,
                models,
                queues: DashMap::new(),
            }),
        }
    }

    /// Number of conversations with a live worker.
    pub fn active_conversations(&self) -> usize {
        self.inner.queues.len()
    }

    pub fn models(&self) -> &ModelSelection {
        &self.inner.models
    }

    /// Schedules a model switch; messages already queued keep the previous model.
    /// `model` must be one of [`ModelSelection::allowed`].
    pub fn enqueue_model_switch(
        &self,
        message: &Message,
        model: &str,
    ) -> std::result::Result<(), HandlerError> {
        self.enqueue(
            Job::SelectModel(message.clone(), model.to_string()),
            &message.conversation_id(),
        )
    }

    /// Schedules a history reset, ordered after any message already queued for the conversation.
    pub fn enqueue_reset(&self, message: &Message) -> std::result::Result<(), HandlerError> {
        self.enqueue(Job::Reset(message.clone()), &message.conversation_id())
    }

    /// Sends while holding the map entry so an idle worker cannot retire between lookup and send.
    fn enqueue(&self, job: Job, conversation_id: &str) -> std::result::Result<(), HandlerError> {
        let entry = self
            .inner
            .queues
            .entry(conversation_id.to_string())
            .or_insert_with(|| self.spawn_worker(conversation_id.to_string()));
        entry
            .send(job)
            .map_err(|_| HandlerError::QueueClosed(conversation_id.to_string()))
    }

    fn spawn_worker(&self, conversation_id: String) -> QueueSender {
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        debug!(conversation_id = %conversation_id, "Starting conversation worker");
        tokio::spawn(Self::process_queue_loop(
            self.inner.clone(),
            rx,
            conversation_id,
        ));
        tx
    }

    /// Consumes one conversation's queue in receipt order. Retires after an idle period, but only
    /// if nothing was enqueued meanwhile (checked under the map entry lock).
    async fn process_queue_loop(
        inner: Arc<Inner>,
        mut rx: mpsc::UnboundedReceiver<Job>,
        conversation_id: String,
    ) {
        let idle = inner.settings.queue_idle_timeout;
        loop {
            match tokio::time::timeout(idle, rx.recv()).await {
                Ok(Some(job)) => inner.process(job).await,
                Ok(None) => break,
                Err(_) => {
                    if inner
                        .queues
                        .remove_if(&conversation_id, |_, _| rx.is_empty())
                        .is_some()
                    {
                        debug!(conversation_id = %conversation_id, "Conversation worker idle, exiting");
                        break;
                    }
                }
            }
        }
    }
}

impl Inner {
    async fn process(&self, job: Job) {
        match job {
            Job::Chat(message) => self.process_message(&message).await,
            Job::Reset(message) => self.process_reset(&message).await,
            Job::SelectModel(message, model) => self.process_model_switch(&message, &model).await,
        }
    }

    async fn send_reply(&self, message: &Message, text: &str) {
        if let Err(e) = self.bot.reply_to(message, text).await {
            error!(
                error = %e,
                chat_id = message.chat.id,
                conversation_id = %message.conversation_id(),
                "Failed to deliver reply, dropping"
            );
        }
    }

    /// Loads history; on store failure continues with none.
    async fn load_history(&self, conversation_id: &str) -> Vec<Turn> {
        match self.store.get(conversation_id).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(
                    error = %e,
                    conversation_id = %conversation_id,
                    "History unavailable, continuing in degraded mode"
                );
                Vec::new()
            }
        }
    }

    async fn save_exchange(&self, conversation_id: &str, user: Turn, assistant: Turn) {
        if let Err(e) = self
            .store
            .append_exchange(conversation_id, user, assistant)
            .await
        {
            warn!(
                error = %e,
                conversation_id = %conversation_id,
                "Failed to save exchange to history"
            );
        }
    }

    #[instrument(skip(self, message), fields(conversation_id = %message.conversation_id()))]
    async fn process_message(&self, message: &Message) {
        let conversation_id = message.conversation_id();
        debug!(user = %message.sender_label(), "Received");

        if !self.serving.is_serving() {
            self.send_reply(message, MSG_UNAVAILABLE).await;
            return;
        }

        let history = self.load_history(&conversation_id).await;
        debug!(turns = history.len(), "HistoryLoaded");

        let history = history.into_iter().map(turn_to_chat_message).collect();
        let fitted = match fit_to_budget(
            self.settings.system_prompt.as_deref(),
            history,
            ChatMessage::user(message.content.clone()),
            self.settings.budget(),
        ) {
            Ok(fitted) => fitted,
            Err(PromptError::TooLong { required, available }) => {
                warn!(required, available, "Message exceeds the prompt budget, not sent");
                self.send_reply(message, MSG_TOO_LONG).await;
                return;
            }
        };
        if fitted.dropped > 0 {
            debug!(dropped = fitted.dropped, "Dropped oldest turns to fit the budget");
        }
        debug!(
            estimated_tokens = fitted.estimated_tokens,
            prompt = %format_transcript(&fitted.messages),
            "Completing"
        );

        if let Err(e) = self.bot.send_typing(&message.chat).await {
            debug!(error = %e, "Typing indicator not sent");
        }

        let request = CompletionRequest {
            messages: fitted.messages,
            model: self.models.current(&conversation_id),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            timeout: self.settings.request_timeout,
        };

        match self.client.complete(&request).await {
            Ok(text) => {
                self.stats.record_success();
                if text.trim().is_empty() {
                    warn!("Completion returned empty text, history unchanged");
                    self.send_reply(message, MSG_EMPTY_REPLY).await;
                    return;
                }
                self.save_exchange(
                    &conversation_id,
                    Turn::new(Role::User, message.content.clone(), message.created_at),
                    Turn::assistant(text.clone()),
                )
                .await;
                self.send_reply(message, &text).await;
                info!(reply_len = text.len(), "Replied");
            }
            Err(err) => {
                self.stats.record_failure();
                error!(error = %err, user = %message.sender_label(), "Failed");
                let reply = match &err {
                    CompletionError::RateLimited { .. } | CompletionError::Network(_) => MSG_BUSY,
                    CompletionError::InvalidRequest(_) => MSG_FAILED,
                    CompletionError::Auth(detail) => {
                        self.serving
                            .mark_not_serving(format!("completion API rejected credentials: {}", detail));
                        MSG_UNAVAILABLE
                    }
                };
                self.send_reply(message, reply).await;
                debug!("Replied with error message");
            }
        }
    }

    #[instrument(skip(self, message), fields(conversation_id = %message.conversation_id()))]
    async fn process_reset(&self, message: &Message) {
        match self.store.clear(&message.conversation_id()).await {
            Ok(()) => {
                info!(user = %message.sender_label(), "History reset");
                self.send_reply(message, MSG_RESET_DONE).await;
            }
            Err(e) => {
                warn!(error = %e, "History reset failed");
                self.send_reply(message, MSG_RESET_FAILED).await;
            }
        }
    }

    #[instrument(skip(self, message), fields(conversation_id = %message.conversation_id()))]
    async fn process_model_switch(&self, message: &Message, model: &str) {
        match self.models.select(&message.conversation_id(), model) {
            Some(model) => self.send_reply(message, &model_selected_text(&model)).await,
            None => warn!(model = %model, "Model no longer allowed, switch ignored"),
        }
    }
}

fn turn_to_chat_message(turn: Turn) -> ChatMessage {
    match turn.role {
        Role::User => ChatMessage::user(turn.content),
        Role::Assistant => ChatMessage::assistant(turn.content),
    }
}

#[async_trait]
impl Handler for Dispatcher {
    #[instrument(skip(self, message))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        if message.content.trim().is_empty() {
            return Ok(HandlerResponse::Continue);
        }

        if !self.inner.serving.is_serving() {
            self.inner.bot.reply_to(message, MSG_UNAVAILABLE).await?;
            return Ok(HandlerResponse::Reply(MSG_UNAVAILABLE.to_string()));
        }

        let conversation_id = message.conversation_id();
        info!(
            user_id = message.user.id,
            conversation_id = %conversation_id,
            "Queuing message"
        );
        self.enqueue(Job::Chat(message.clone()), &conversation_id)?;
        Ok(HandlerResponse::Stop)
    }
}
