//! Redis-backed ConversationStore.
//!
//! Each conversation is one list at `{key_prefix}{conversation_id}` holding JSON turns
//! oldest-first. Appends run as one `MULTI` pipeline (`RPUSH`, `LTRIM`, `EXPIRE`).

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, IntoConnectionInfo};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{ConversationStore, StoreError, Turn};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RedisConversationStore {
    client: Client,
    /// Cached connection; dropped after a failed command so the next call reconnects.
    connection: Mutex<Option<MultiplexedConnection>>,
    key_prefix: String,
    max_turns: usize,
    /// Expiry refreshed on every append; `None` keeps history until cleared.
    ttl: Option<Duration>,
    connect_timeout: Duration,
}

impl RedisConversationStore {
    /// Does not connect; the first operation does. `target` is a URL or a
    /// [`redis::ConnectionInfo`].
    pub fn new(
        target: impl IntoConnectionInfo,
        key_prefix: impl Into<String>,
        max_turns: usize,
        ttl: Option<Duration>,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::open(target)?,
            connection: Mutex::new(None),
            key_prefix: key_prefix.into(),
            max_turns: max_turns.max(1),
            ttl: ttl.filter(|t| !t.is_zero()),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn key(&self, conversation_id: &str) -> String {
        format!("{}{}", self.key_prefix, conversation_id)
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection, StoreError> {
        let mut cached = self.connection.lock().await;
        if let Some(conn) = cached.as_ref() {
            return Ok(conn.clone());
        }
        let conn = tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            StoreError::Unavailable(format!(
                "connect timed out after {:?}",
                self.connect_timeout
            ))
        })??;
        info!("Connected to Redis");
        *cached = Some(conn.clone());
        Ok(conn)
    }

    async fn reset_connection(&self) {
        *self.connection.lock().await = None;
    }

    /// One `MULTI`: `RPUSH` all entries, trim to the cap, refresh expiry.
    async fn push(&self, conversation_id: &str, entries: Vec<String>) -> Result<(), StoreError> {
        let key = self.key(conversation_id);
        let count = entries.len();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .rpush(&key, entries)
            .ignore()
            .ltrim(&key, -(self.max_turns as isize), -1)
            .ignore();
        if let Some(ttl) = self.ttl {
            pipe.cmd("EXPIRE").arg(&key).arg(ttl.as_secs()).ignore();
        }

        let mut conn = self.get_connection().await?;
        self.checked(pipe.query_async::<_, ()>(&mut conn).await)
            .await?;
        debug!(key = %key, count, "Appended turns");
        Ok(())
    }

    /// Drops the cached connection when `result` is an error, then passes it through.
    async fn checked<T>(&self, result: redis::RedisResult<T>) -> Result<T, StoreError> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(error = %e, "Redis command failed, dropping connection");
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl ConversationStore for RedisConversationStore {
    #[instrument(skip(self))]
    async fn get(&self, conversation_id: &str) -> Result<Vec<Turn>, StoreError> {
        let key = self.key(conversation_id);
        let mut conn = self.get_connection().await?;
        let entries: Vec<String> = self.checked(conn.lrange(&key, 0, -1).await).await?;

        let mut turns = Vec::with_capacity(entries.len());
        for entry in &entries {
            match serde_json::from_str::<Turn>(entry) {
                Ok(turn) => turns.push(turn),
                Err(e) => warn!(key = %key, error = %e, "Skipping undecodable history entry"),
            }
        }
        debug!(key = %key, turns = turns.len(), "Loaded history");
        Ok(turns)
    }

    #[instrument(skip(self, turn))]
    async fn append(&self, conversation_id: &str, turn: Turn) -> Result<(), StoreError> {
        self.push(conversation_id, vec![serde_json::to_string(&turn)?])
            .await
    }

    #[instrument(skip(self, user, assistant))]
    async fn append_exchange(
        &self,
        conversation_id: &str,
        user: Turn,
        assistant: Turn,
    ) -> Result<(), StoreError> {
        let entries = vec![
            serde_json::to_string(&user)?,
            serde_json::to_string(&assistant)?,
        ];
        self.push(conversation_id, entries).await
    }

    #[instrument(skip(self))]
    async fn clear(&self, conversation_id: &str) -> Result<(), StoreError> {
        let key = self.key(conversation_id);
        let mut conn = self.get_connection().await?;
        let removed: i64 = self.checked(conn.del(&key).await).await?;
        debug!(key = %key, removed = removed, "Cleared history");
        Ok(())
    }

    fn max_turns(&self) -> usize {
        self.max_turns
    }
}
