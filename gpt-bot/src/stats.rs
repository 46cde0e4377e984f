//! Completion outcome counters backing `/state`.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct CompletionStats {
    success: AtomicU64,
    failure: AtomicU64,
}

impl CompletionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failure.fetch_add(1, Ordering::Relaxed);
    }

    pub fn successes(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failure.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.successes() + self.failures()
    }

    /// `success / total * 100`; 100 before any call.
    pub fn stability_percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 100.0;
        }
        self.successes() as f64 / total as f64 * 100.0
    }
}
