//! Shared test doubles: recording bot, scripted completion client, failing stores.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use conversation_store::{ConversationStore, InMemoryConversationStore, StoreError, Turn};
use dbot_core::{Bot, Chat, Message, User};
use gpt_bot::DispatcherSettings;
use llm_client::{CompletionClient, CompletionError, CompletionRequest};

/// Records every sent message as `(chat_id, text)` and counts typing indicators.
#[derive(Default)]
pub struct MockBot {
    sent: Mutex<Vec<(i64, String)>>,
    typing: AtomicUsize,
}

impl MockBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn typing_count(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    /// Waits until at least `n` messages were sent; panics after 5 seconds.
    pub async fn wait_for(&self, n: usize) -> Vec<String> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let texts = self.texts();
            if texts.len() >= n {
                return texts;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("expected {} replies, got {:?}", n, texts);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_message(&self, chat: &Chat, text: &str) -> dbot_core::Result<()> {
        self.sent.lock().unwrap().push((chat.id, text.to_string()));
        Ok(())
    }

    async fn send_typing(&self, _chat: &Chat) -> dbot_core::Result<()> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Returns scripted results in order (then repeats `fallback`), recording each request.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    fallback: Result<String, CompletionError>,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<String, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback: Err(CompletionError::Network("script exhausted".to_string())),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(result: Result<String, CompletionError>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: result,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Replies `re: <last user message>` after a short delay.
pub struct EchoClient {
    pub delay: Duration,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl EchoClient {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for EchoClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::time::sleep(self.delay).await;
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(format!("re: {}", last))
    }
}

/// Every operation fails as if Redis were down.
pub struct FailingStore;

#[async_trait]
impl ConversationStore for FailingStore {
    async fn get(&self, _conversation_id: &str) -> Result<Vec<Turn>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn append(&self, _conversation_id: &str, _turn: Turn) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn append_exchange(
        &self,
        _conversation_id: &str,
        _user: Turn,
        _assistant: Turn,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn clear(&self, _conversation_id: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn max_turns(&self) -> usize {
        20
    }
}

/// In-memory store whose first `failures` exchange writes fail, as if Redis dropped mid-write.
pub struct FlakyStore {
    pub inner: InMemoryConversationStore,
    failures: AtomicUsize,
}

impl FlakyStore {
    pub fn new(max_turns: usize, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryConversationStore::new(max_turns),
            failures: AtomicUsize::new(failures),
        })
    }
}

#[async_trait]
impl ConversationStore for FlakyStore {
    async fn get(&self, conversation_id: &str) -> Result<Vec<Turn>, StoreError> {
        self.inner.get(conversation_id).await
    }

    async fn append(&self, conversation_id: &str, turn: Turn) -> Result<(), StoreError> {
        self.inner.append(conversation_id, turn).await
    }

    async fn append_exchange(
        &self,
        conversation_id: &str,
        user: Turn,
        assistant: Turn,
    ) -> Result<(), StoreError> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner
            .append_exchange(conversation_id, user, assistant)
            .await
    }

    async fn clear(&self, conversation_id: &str) -> Result<(), StoreError> {
        self.inner.clear(conversation_id).await
    }

    fn max_turns(&self) -> usize {
        self.inner.max_turns()
    }
}

pub fn settings() -> DispatcherSettings {
    DispatcherSettings {
        model: "gpt-3.5-turbo".to_string(),
        allowed_models: vec!["gpt-3.5-turbo".to_string(), "gpt-4o".to_string()],
        temperature: 0.7,
        max_tokens: 512,
        context_token_limit: 4096,
        request_timeout: Duration::from_secs(5),
        system_prompt: None,
        queue_idle_timeout: Duration::from_secs(300),
    }
}

pub fn create_test_message(chat_id: i64, content: &str) -> Message {
    Message {
        id: format!("{}-{}", chat_id, content.len()),
        user: User {
            id: 123,
            username: Some("test_user".to_string()),
            first_name: Some("Test".to_string()),
            last_name: None,
        },
        chat: Chat {
            id: chat_id,
            chat_type: "private".to_string(),
        },
        content: content.to_string(),
        created_at: Utc::now(),
    }
}
