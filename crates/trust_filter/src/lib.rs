//! Webhook event model and trust filtering.
//!
//! This crate decides whether an inbound webhook event is eligible for
//! processing. Events are decoded once at ingress into a closed
//! [`WebhookEvent`] enum (no string dispatch downstream), then evaluated
//! against a [`TrustFilter`] built from read-only configuration:
//!
//! 1. Actor-type exclusion (only human users; bots are dropped silently)
//! 2. Repository allow-list (default-open when unconfigured)
//! 3. Author ignore-list
//! 4. Title ignore-patterns
//! 5. Source/destination branch ignore-patterns
//!
//! A dropped event is a normal, logged outcome, not a failure; the
//! webhook endpoint still acknowledges the delivery so the platform does
//! not retry.

mod event;
mod filter;

pub use event::{
    Actor, CommentEvent, EventDecodeError, InstalledPayload, PullRequest, PullRequestEvent,
    UninstalledPayload, WebhookEvent,
};
pub use filter::{DropReason, FilterDecision, TrustFilter, TrustFilterConfig, TrustFilterError};
