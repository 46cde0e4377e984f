//! Store error types.

use thiserror::Error;

/// Errors from [`ConversationStore`](crate::ConversationStore) operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the command.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
