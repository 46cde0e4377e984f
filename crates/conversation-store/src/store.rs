//! ConversationStore trait.

use async_trait::async_trait;

use crate::{StoreError, Turn};

/// Bounded, append-only turn history keyed by conversation id.
///
/// Implementations keep at most [`max_turns`](Self::max_turns) turns per conversation and evict
/// the oldest first.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Turns oldest-first; empty for an unknown conversation.
    async fn get(&self, conversation_id: &str) -> Result<Vec<Turn>, StoreError>;

    /// Appends one turn, trims to the cap and refreshes expiry.
    async fn append(&self, conversation_id: &str, turn: Turn) -> Result<(), StoreError>;

    /// Appends a user turn and its answer as one unit: either both are stored or neither is.
    async fn append_exchange(
        &self,
        conversation_id: &str,
        user: Turn,
        assistant: Turn,
    ) -> Result<(), StoreError>;

    /// Deletes the conversation's history.
    async fn clear(&self, conversation_id: &str) -> Result<(), StoreError>;

    fn max_turns(&self) -> usize;
}
