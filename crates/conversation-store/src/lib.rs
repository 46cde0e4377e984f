//! Conversation store: bounded, time-ordered turn history per conversation.
//!
//! ## Modules
//!
//! - [`model`] – Turn, Role
//! - [`store`] – ConversationStore trait
//! - [`redis_store`] – RedisConversationStore (list per conversation)
//! - [`in_memory`] – InMemoryConversationStore
//! - [`config`] – StoreConfig and backend selection
//! - [`error`] – StoreError

mod config;
mod error;
mod in_memory;
mod model;
mod redis_store;
mod store;

pub use config::{create_store, RedisTarget, StoreBackend, StoreConfig};
pub use error::StoreError;
pub use in_memory::InMemoryConversationStore;
pub use model::{Role, Turn};
pub use redis_store::RedisConversationStore;
pub use store::ConversationStore;
