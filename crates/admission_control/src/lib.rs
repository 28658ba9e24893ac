//! Admission control for inbound webhook deliveries.
//!
//! Two independent mechanisms guard the ingress:
//!
//! - [`RateLimiter`]: per-source sliding-window rate limiting. A rejected
//!   delivery must be answered with an HTTP 429 at the ingress boundary
//!   and must never reach authentication or trust filtering.
//! - [`InFlightTracker`]: a process-wide count of webhook pipelines
//!   currently running in the background. The concurrency ceiling is
//!   advisory: exceeding it logs a warning but does not reject the
//!   request (a documented soft limit, not backpressure).
//!
//! Both are plain injectable objects owned by the server state rather than
//! process globals, so tests get isolated instances.

mod in_flight;
mod rate_limit;

pub use in_flight::{InFlightGuard, InFlightTracker, DEFAULT_MAX_CONCURRENT};
pub use rate_limit::{RateLimiter, DEFAULT_RATE_LIMIT_PER_MINUTE};
