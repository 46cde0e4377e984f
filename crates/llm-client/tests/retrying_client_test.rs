//! Tests for [`llm_client::RetryingClient`] with scripted stub clients.
//!
//! Covers: retry until success within the bound, exhaustion returns the last error, fatal errors
//! are not retried, and the per-attempt timeout counts as a Network failure.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use llm_client::{CompletionClient, CompletionError, CompletionRequest, RetryPolicy, RetryingClient};
use prompt::ChatMessage;

/// Returns scripted results in order; counts calls.
struct ScriptedClient {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    fn new(script: Vec<Result<String, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Network("script exhausted".to_string())))
    }
}

/// Never answers within the timeout.
struct HangingClient;

#[async_trait]
impl CompletionClient for HangingClient {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_string())
    }
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        jitter: 0.0,
    }
}

fn request(timeout: Duration) -> CompletionRequest {
    CompletionRequest {
        messages: vec![ChatMessage::user("hi")],
        model: "gpt-3.5-turbo".to_string(),
        temperature: 0.7,
        max_tokens: 16,
        timeout,
    }
}

fn rate_limited() -> Result<String, CompletionError> {
    Err(CompletionError::RateLimited { retry_after: None })
}

/// **Test: RateLimited twice then success is retried and returns the text (3 calls).**
#[tokio::test]
async fn test_rate_limited_twice_then_success() {
    let stub = ScriptedClient::new(vec![rate_limited(), rate_limited(), Ok("done".to_string())]);
    let client = RetryingClient::new(stub.clone(), fast_policy(3));

    let reply = client.complete(&request(Duration::from_secs(5))).await;

    assert_eq!(reply, Ok("done".to_string()));
    assert_eq!(stub.calls(), 3);
}

/// **Test: With a bound of 2 the same script fails with the last error.**
#[tokio::test]
async fn test_exhaustion_returns_last_error() {
    let stub = ScriptedClient::new(vec![
        rate_limited(),
        Err(CompletionError::Network("reset".to_string())),
        Ok("never".to_string()),
    ]);
    let client = RetryingClient::new(stub.clone(), fast_policy(2));

    let reply = client.complete(&request(Duration::from_secs(5))).await;

    assert_eq!(reply, Err(CompletionError::Network("reset".to_string())));
    assert_eq!(stub.calls(), 2);
}

/// **Test: Auth and InvalidRequest are returned after a single call.**
#[tokio::test]
async fn test_fatal_errors_are_not_retried() {
    for fatal in [
        CompletionError::Auth("bad key".to_string()),
        CompletionError::InvalidRequest("bad".to_string()),
    ] {
        let stub = ScriptedClient::new(vec![Err(fatal.clone()), Ok("never".to_string())]);
        let client = RetryingClient::new(stub.clone(), fast_policy(5));

        let reply = client.complete(&request(Duration::from_secs(5))).await;

        assert_eq!(reply, Err(fatal));
        assert_eq!(stub.calls(), 1);
    }
}

/// **Test: An attempt exceeding the timeout becomes a Network error and is retried.**
#[tokio::test]
async fn test_timeout_is_network_error() {
    let client = RetryingClient::new(Arc::new(HangingClient), fast_policy(2));

    let reply = client.complete(&request(Duration::from_millis(20))).await;

    assert!(matches!(reply, Err(CompletionError::Network(ref m)) if m.contains("timed out")));
}
