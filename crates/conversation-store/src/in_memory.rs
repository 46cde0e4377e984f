//! In-memory ConversationStore for local runs and tests. No expiry.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{ConversationStore, StoreError, Turn};

pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<String, VecDeque<Turn>>>,
    max_turns: usize,
}

impl InMemoryConversationStore {
    /// `max_turns` below 1 behaves as 1.
    pub fn new(max_turns: usize) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            max_turns: max_turns.max(1),
        }
    }

    async fn push(&self, conversation_id: &str, new_turns: impl IntoIterator<Item = Turn>) {
        let mut conversations = self.conversations.write().await;
        let turns = conversations
            .entry(conversation_id.to_string())
            .or_default();
        turns.extend(new_turns);
        while turns.len() > self.max_turns {
            turns.pop_front();
        }
        debug!(
            conversation_id = %conversation_id,
            turns = turns.len(),
            "Appended turns"
        );
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, conversation_id: &str) -> Result<Vec<Turn>, StoreError> {
        let conversations = self.conversations.read().await;
        Ok(conversations
            .get(conversation_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn append(&self, conversation_id: &str, turn: Turn) -> Result<(), StoreError> {
        self.push(conversation_id, [turn]).await;
        Ok(())
    }

    async fn append_exchange(
        &self,
        conversation_id: &str,
        user: Turn,
        assistant: Turn,
    ) -> Result<(), StoreError> {
        self.push(conversation_id, [user, assistant]).await;
        Ok(())
    }

    async fn clear(&self, conversation_id: &str) -> Result<(), StoreError> {
        self.conversations.write().await.remove(conversation_id);
        Ok(())
    }

    fn max_turns(&self) -> usize {
        self.max_turns
    }
}
