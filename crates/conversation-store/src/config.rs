//! Store configuration and backend selection.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dbot_core::{env_non_empty, env_or};
use redis::{ConnectionAddr, ConnectionInfo, IntoConnectionInfo, RedisConnectionInfo};
use tracing::info;

use crate::{ConversationStore, InMemoryConversationStore, RedisConversationStore};

/// Which [`ConversationStore`] implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" | "in-memory" | "inmemory" => Ok(StoreBackend::Memory),
            other => bail!("Unsupported conversation store type: {}", other),
        }
    }
}

/// Store config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub redis: RedisTarget,
    pub key_prefix: String,
    pub max_turns: usize,
    /// Seconds; 0 disables expiry.
    pub ttl_secs: u64,
}

/// Where the Redis server is: a full URL, or the individual `REDIS_*` parts.
///
/// Parts are never joined into a URL, so the password may contain any character.
#[derive(Clone, PartialEq, Eq)]
pub enum RedisTarget {
    Url(String),
    Parts {
        host: String,
        port: u16,
        db: i64,
        password: Option<String>,
    },
}

impl RedisTarget {
    pub fn connection_info(&self) -> redis::RedisResult<ConnectionInfo> {
        match self {
            RedisTarget::Url(url) => url.as_str().into_connection_info(),
            RedisTarget::Parts {
                host,
                port,
                db,
                password,
            } => Ok(ConnectionInfo {
                addr: ConnectionAddr::Tcp(host.clone(), *port),
                redis: RedisConnectionInfo {
                    db: *db,
                    password: password.clone(),
                    ..Default::default()
                },
            }),
        }
    }
}

// Hand-written so passwords never reach logs.
impl std::fmt::Debug for RedisTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedisTarget::Url(_) => f.write_str("Url(***)"),
            RedisTarget::Parts { host, port, db, .. } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("db", db)
                .finish_non_exhaustive(),
        }
    }
}

impl StoreConfig {
    /// Load from environment variables. `REDIS_URL` wins over the `REDIS_HOST`/`REDIS_PORT`/
    /// `REDIS_DB`/`REDIS_PASSWORD` parts.
    pub fn from_env() -> Result<Self> {
        let backend = env_or("CONVERSATION_STORE", StoreBackend::Redis)?;
        let redis = match env_non_empty("REDIS_URL") {
            Some(url) => RedisTarget::Url(url),
            None => RedisTarget::Parts {
                host: env_non_empty("REDIS_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: env_or("REDIS_PORT", 6379u16)?,
                db: env_or("REDIS_DB", 0i64)?,
                password: env::var("REDIS_PASSWORD").ok().filter(|s| !s.is_empty()),
            },
        };
        Ok(Self {
            backend,
            redis,
            key_prefix: env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| "conversation:".to_string()),
            max_turns: env_or("HISTORY_MAX_TURNS", 20)?,
            ttl_secs: env_or("HISTORY_TTL_SECS", 604_800)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_turns == 0 || self.max_turns % 2 != 0 {
            // Exchanges are stored in pairs; an odd cap would evict half of one.
            bail!(
                "HISTORY_MAX_TURNS must be a positive even number, got {}",
                self.max_turns
            );
        }
        if self.backend == StoreBackend::Redis {
            match &self.redis {
                RedisTarget::Url(url) if url.trim().is_empty() => {
                    bail!("REDIS_URL must not be empty when CONVERSATION_STORE=redis")
                }
                RedisTarget::Parts { host, .. } if host.trim().is_empty() => {
                    bail!("REDIS_HOST must not be empty when CONVERSATION_STORE=redis")
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

/// Builds the configured store. Redis is not contacted until the first operation.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn ConversationStore>> {
    match config.backend {
        StoreBackend::Redis => {
            info!(
                redis = ?config.redis,
                key_prefix = %config.key_prefix,
                max_turns = config.max_turns,
                ttl_secs = config.ttl_secs,
                "Using Redis conversation store"
            );
            let info = config
                .redis
                .connection_info()
                .context("Invalid Redis connection settings")?;
            let store = RedisConversationStore::new(
                info,
                config.key_prefix.clone(),
                config.max_turns,
                config.ttl(),
            )
            .context("Failed to create Redis conversation store")?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!(max_turns = config.max_turns, "Using in-memory conversation store");
            Ok(Arc::new(InMemoryConversationStore::new(config.max_turns)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_keep_password_verbatim() {
        let target = RedisTarget::Parts {
            host: "cache".to_string(),
            port: 6380,
            db: 2,
            password: Some("ab/cd#ef?%".to_string()),
        };
        let info = target.connection_info().unwrap();
        assert!(matches!(&info.addr, ConnectionAddr::Tcp(host, 6380) if host == "cache"));
        assert_eq!(info.redis.db, 2);
        assert_eq!(info.redis.password.as_deref(), Some("ab/cd#ef?%"));
        assert!(!format!("{:?}", target).contains("ab/cd"));
    }

    #[test]
    fn url_target_is_parsed() {
        let info = RedisTarget::Url("redis://other:7000/1".to_string())
            .connection_info()
            .unwrap();
        assert_eq!(info.redis.db, 1);
        assert!(RedisTarget::Url("not a url".to_string())
            .connection_info()
            .is_err());
    }

    #[test]
    fn backend_parsing() {
        assert_eq!("Redis".parse::<StoreBackend>().unwrap(), StoreBackend::Redis);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }
}
