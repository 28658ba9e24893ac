//! Sliding-window rate limiting keyed by source identifier.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

#[cfg(test)]
#[path = "rate_limit_tests.rs"]
mod tests;

/// Default admissions allowed per source per minute.
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: usize = 60;

/// Trailing window over which admissions are counted.
const WINDOW: Duration = Duration::from_secs(60);

/// Per-source sliding-window rate limiter.
///
/// Each source identifier (typically the caller's IP address) gets an
/// independent window of admission timestamps covering the trailing 60
/// seconds. The window map lives behind a mutex: concurrent handlers for
/// the same source must not race, because a lost update would silently
/// raise the effective ceiling.
pub struct RateLimiter {
    max_per_minute: usize,
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter with the given per-minute ceiling.
    pub fn new(max_per_minute: usize) -> Self {
        Self {
            max_per_minute,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether a delivery from `source_id` may be admitted.
    ///
    /// Stale entries are pruned first; if the remaining count is below the
    /// ceiling, the current timestamp is appended and the delivery is
    /// admitted. A rejection does not mutate the window, so a throttled
    /// caller does not extend its own throttling.
    pub fn check_rate(&self, source_id: &str) -> bool {
        self.check_rate_at(source_id, Instant::now())
    }

    fn check_rate_at(&self, source_id: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        // Sweep out sources whose windows have fully expired, so the map
        // stays bounded by the set of recently active sources.
        windows.retain(|_, window| {
            window.retain(|ts| now.duration_since(*ts) < WINDOW);
            !window.is_empty()
        });

        let window = windows.entry(source_id.to_string()).or_default();

        if window.len() >= self.max_per_minute {
            warn!(source_id, "rate limit exceeded");
            return false;
        }

        window.push(now);
        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT_PER_MINUTE)
    }
}
