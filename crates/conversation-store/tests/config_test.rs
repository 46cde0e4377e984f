//! Tests for [`conversation_store::StoreConfig`] loading and [`conversation_store::create_store`].
//!
//! Environment-mutating; serialized with `serial_test`.

use std::env;

use conversation_store::{create_store, RedisTarget, StoreBackend, StoreConfig, Turn};
use serial_test::serial;

const VARS: &[&str] = &[
    "CONVERSATION_STORE",
    "REDIS_URL",
    "REDIS_HOST",
    "REDIS_PORT",
    "REDIS_DB",
    "REDIS_PASSWORD",
    "REDIS_KEY_PREFIX",
    "HISTORY_MAX_TURNS",
    "HISTORY_TTL_SECS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

/// **Test: Defaults point at a local Redis.**
#[test]
#[serial]
fn test_defaults() {
    clear_env();
    let config = StoreConfig::from_env().unwrap();
    config.validate().unwrap();

    assert_eq!(config.backend, StoreBackend::Redis);
    assert_eq!(
        config.redis,
        RedisTarget::Parts {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            password: None,
        }
    );
    assert_eq!(config.key_prefix, "conversation:");
    assert_eq!(config.max_turns, 20);
    assert_eq!(config.ttl_secs, 604_800);
    assert!(config.ttl().is_some());
}

/// **Test: REDIS_URL wins over the individual parts.**
#[test]
#[serial]
fn test_redis_url_precedence() {
    clear_env();
    env::set_var("REDIS_HOST", "cache");
    env::set_var("REDIS_PASSWORD", "pw");
    env::set_var("REDIS_DB", "3");
    assert!(matches!(
        StoreConfig::from_env().unwrap().redis,
        RedisTarget::Parts { ref host, db: 3, ref password, .. }
            if host == "cache" && password.as_deref() == Some("pw")
    ));

    env::set_var("REDIS_URL", "redis://other:7000/1");
    assert_eq!(
        StoreConfig::from_env().unwrap().redis,
        RedisTarget::Url("redis://other:7000/1".to_string())
    );
    clear_env();
}

/// **Test: A password with URL-reserved characters still yields a usable store.**
#[test]
#[serial]
fn test_password_with_reserved_characters() {
    clear_env();
    env::set_var("REDIS_HOST", "cache");
    env::set_var("REDIS_PASSWORD", "ab/cd#ef?g%h");
    let config = StoreConfig::from_env().unwrap();
    config.validate().unwrap();

    let info = config.redis.connection_info().unwrap();
    assert_eq!(info.redis.password.as_deref(), Some("ab/cd#ef?g%h"));
    assert!(create_store(&config).is_ok());
    clear_env();
}

/// **Test: Zero or odd max turns is rejected; zero TTL disables expiry.**
#[test]
#[serial]
fn test_limits() {
    clear_env();
    env::set_var("HISTORY_MAX_TURNS", "0");
    env::set_var("HISTORY_TTL_SECS", "0");
    let config = StoreConfig::from_env().unwrap();
    assert!(config.validate().is_err());
    assert_eq!(config.ttl(), None);

    env::set_var("HISTORY_MAX_TURNS", "7");
    let err = StoreConfig::from_env().unwrap().validate().unwrap_err();
    assert!(err.to_string().contains("even"));
    clear_env();
}

/// **Test: The memory backend is usable immediately.**
#[tokio::test]
#[serial]
async fn test_create_memory_store() {
    clear_env();
    env::set_var("CONVERSATION_STORE", "memory");
    env::set_var("HISTORY_MAX_TURNS", "2");
    let config = StoreConfig::from_env().unwrap();
    let store = create_store(&config).unwrap();

    store.append("1", Turn::user("a")).await.unwrap();
    store.append("1", Turn::user("b")).await.unwrap();
    store.append("1", Turn::user("c")).await.unwrap();

    assert_eq!(store.max_turns(), 2);
    assert_eq!(store.get("1").await.unwrap().len(), 2);
    clear_env();
}
