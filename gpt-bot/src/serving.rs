//! Process-wide serving state. Cleared once on a fatal completion failure (bad credentials).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;
use tracing::error;

/// Shared between the dispatcher (which clears it) and the runner (which waits on it).
#[derive(Debug)]
pub struct ServingState {
    serving: AtomicBool,
    reason: Mutex<Option<String>>,
    notify: Notify,
}

impl Default for ServingState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServingState {
    pub fn new() -> Self {
        Self {
            serving: AtomicBool::new(true),
            reason: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    pub fn is_serving(&self) -> bool {
        self.serving.load(Ordering::SeqCst)
    }

    /// Marks the process non-serving. Only the first call records its reason.
    pub fn mark_not_serving(&self, reason: impl Into<String>) {
        if self.serving.swap(false, Ordering::SeqCst) {
            let reason = reason.into();
            error!(reason = %reason, "Bot marked non-serving");
            if let Ok(mut slot) = self.reason.lock() {
                *slot = Some(reason);
            }
            self.notify.notify_waiters();
        }
    }

    pub fn reason(&self) -> Option<String> {
        self.reason.lock().ok().and_then(|r| r.clone())
    }

    /// Resolves once the process is non-serving.
    pub async fn wait_not_serving(&self) {
        loop {
            let notified = self.notify.notified();
            if !self.is_serving() {
                return;
            }
            notified.await;
        }
    }
}
