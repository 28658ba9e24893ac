//! Advisory tracking of in-flight webhook pipelines.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::warn;

#[cfg(test)]
#[path = "in_flight_tests.rs"]
mod tests;

/// Default advisory ceiling for concurrently running pipelines.
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Counts webhook pipelines currently executing in the background.
///
/// The ceiling is advisory only: [`check_concurrency`] returning `false`
/// means the caller should log a warning, not reject the delivery. This
/// preserves the receiver's documented soft-limit behavior; hardening it
/// into a hard gate would change what callers observe.
///
/// [`check_concurrency`]: InFlightTracker::check_concurrency
pub struct InFlightTracker {
    max_concurrent: usize,
    current: Arc<AtomicUsize>,
}

impl InFlightTracker {
    /// Create a tracker with the given advisory ceiling.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            current: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of pipelines currently in flight.
    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Check the advisory ceiling. Logs and returns `false` when the
    /// count has reached it; the caller may still proceed.
    pub fn check_concurrency(&self) -> bool {
        let current = self.current();
        if current >= self.max_concurrent {
            warn!(
                current,
                max = self.max_concurrent,
                "concurrent webhook limit reached"
            );
            return false;
        }
        true
    }

    /// Mark a pipeline as started. The returned guard decrements the
    /// count when dropped, so the bracket survives panics and early
    /// returns inside the task.
    pub fn start(&self) -> InFlightGuard {
        self.current.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            current: Arc::clone(&self.current),
        }
    }
}

impl Default for InFlightTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

/// RAII bracket around one running pipeline.
pub struct InFlightGuard {
    current: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}
