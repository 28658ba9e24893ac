//! Eligibility checks for decoded webhook events.

use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::event::{Actor, PullRequest, WebhookEvent};

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;

/// The only actor type treated as human; everything else is a bot.
const ALLOWED_ACTOR_TYPE: &str = "user";

/// Construction error: the filter refuses invalid configuration up front
/// rather than failing per event.
#[derive(Debug, Error)]
pub enum TrustFilterError {
    #[error("invalid ignore pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Raw, read-only filter configuration.
#[derive(Debug, Clone, Default)]
pub struct TrustFilterConfig {
    /// Repository allow-list. Empty means allow all (default-open).
    pub allowed_repos: Vec<String>,
    /// Author display names whose events are ignored.
    pub ignore_authors: Vec<String>,
    /// Regexes matched against pull request titles.
    pub ignore_title_patterns: Vec<String>,
    /// Regexes matched against source branch names.
    pub ignore_source_branch_patterns: Vec<String>,
    /// Regexes matched against destination branch names.
    pub ignore_target_branch_patterns: Vec<String>,
}

/// Outcome of evaluating an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// The event is eligible for processing.
    Process,
    /// The event is dropped; the delivery is still acknowledged.
    Drop(DropReason),
}

impl FilterDecision {
    pub fn is_process(&self) -> bool {
        matches!(self, Self::Process)
    }
}

/// Why an event was dropped. Logged at info level: a drop is a normal
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Actor type is not the allowed human-user type.
    BotActor,
    /// Event kind or shape this receiver does not handle.
    UnsupportedKind,
    /// Repository did not match the allow-list.
    RepoNotAllowed,
    /// Author is on the ignore list.
    IgnoredAuthor,
    /// Title matched an ignore pattern.
    IgnoredTitle,
    /// Source branch matched an ignore pattern.
    IgnoredSourceBranch,
    /// Destination branch matched an ignore pattern.
    IgnoredTargetBranch,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::BotActor => "actor is not a user",
            Self::UnsupportedKind => "unsupported event kind",
            Self::RepoNotAllowed => "repository not in allow-list",
            Self::IgnoredAuthor => "author is ignored",
            Self::IgnoredTitle => "title matches ignore pattern",
            Self::IgnoredSourceBranch => "source branch matches ignore pattern",
            Self::IgnoredTargetBranch => "destination branch matches ignore pattern",
        };
        f.write_str(reason)
    }
}

/// Declarative eligibility filter over decoded webhook events.
///
/// Checks run in a fixed order and short-circuit at the first negative:
/// actor type, repository allow-list, ignored authors, title patterns,
/// branch patterns.
pub struct TrustFilter {
    allowed_repos: Vec<String>,
    ignore_authors: Vec<String>,
    ignore_titles: Vec<Regex>,
    ignore_source_branches: Vec<Regex>,
    ignore_target_branches: Vec<Regex>,
}

impl TrustFilter {
    /// Build a filter, compiling all ignore patterns.
    ///
    /// # Errors
    ///
    /// Returns [`TrustFilterError::InvalidPattern`] for any regex that
    /// fails to compile, so misconfiguration is caught at startup.
    pub fn new(config: TrustFilterConfig) -> Result<Self, TrustFilterError> {
        Ok(Self {
            allowed_repos: config.allowed_repos,
            ignore_authors: config.ignore_authors,
            ignore_titles: compile_patterns(config.ignore_title_patterns)?,
            ignore_source_branches: compile_patterns(config.ignore_source_branch_patterns)?,
            ignore_target_branches: compile_patterns(config.ignore_target_branch_patterns)?,
        })
    }

    /// Evaluate an event, logging the reason when it is dropped.
    pub fn evaluate(&self, event: &WebhookEvent) -> FilterDecision {
        let decision = self.decide(event);
        if let FilterDecision::Drop(reason) = &decision {
            info!(event = event.kind(), %reason, "event dropped by trust filter");
        }
        decision
    }

    fn decide(&self, event: &WebhookEvent) -> FilterDecision {
        if matches!(event, WebhookEvent::Unsupported { .. }) {
            return FilterDecision::Drop(DropReason::UnsupportedKind);
        }

        if let Some(actor) = event.actor() {
            if is_bot(actor) {
                return FilterDecision::Drop(DropReason::BotActor);
            }
        }

        let Some(pr) = event.pull_request() else {
            return FilterDecision::Drop(DropReason::UnsupportedKind);
        };

        if let Some(url) = pr.html_url() {
            if !self.is_repo_allowed(url) {
                return FilterDecision::Drop(DropReason::RepoNotAllowed);
            }
        }

        if let Some(reason) = self.check_ignore_rules(event.actor(), pr) {
            return FilterDecision::Drop(reason);
        }

        FilterDecision::Process
    }

    /// Check a repository URL against the allow-list.
    ///
    /// An empty allow-list permits every repository. A non-empty list
    /// matches on exact normalized-URL equality, a suffix match on the
    /// entry or its last path segment, or a `/entry` substring.
    pub fn is_repo_allowed(&self, repo_url: &str) -> bool {
        if self.allowed_repos.is_empty() {
            return true;
        }

        let normalized = normalize_repo(repo_url);

        self.allowed_repos.iter().any(|entry| {
            let entry = normalize_repo(entry);
            if normalized == entry {
                return true;
            }

            if normalized.ends_with(&format!("/{entry}")) {
                return true;
            }

            if let Some(last_segment) = entry.rsplit('/').next() {
                if normalized.ends_with(&format!("/{last_segment}")) {
                    return true;
                }
            }

            normalized.contains(&format!("/{entry}"))
        })
    }

    fn check_ignore_rules(&self, actor: Option<&Actor>, pr: &PullRequest) -> Option<DropReason> {
        if let Some(actor) = actor {
            let author = actor.name();
            if !author.is_empty() && self.ignore_authors.iter().any(|a| a == author) {
                return Some(DropReason::IgnoredAuthor);
            }
        }

        let title = pr.title();
        if !title.is_empty() && self.ignore_titles.iter().any(|re| re.is_match(title)) {
            return Some(DropReason::IgnoredTitle);
        }

        let source = pr.source_branch();
        if !source.is_empty()
            && self
                .ignore_source_branches
                .iter()
                .any(|re| re.is_match(source))
        {
            return Some(DropReason::IgnoredSourceBranch);
        }

        let target = pr.destination_branch();
        if !target.is_empty()
            && self
                .ignore_target_branches
                .iter()
                .any(|re| re.is_match(target))
        {
            return Some(DropReason::IgnoredTargetBranch);
        }

        None
    }
}

fn is_bot(actor: &Actor) -> bool {
    match actor.kind.as_deref() {
        Some(kind) => !kind.eq_ignore_ascii_case(ALLOWED_ACTOR_TYPE),
        // Payloads without a declared type are not treated as bots.
        None => false,
    }
}

fn normalize_repo(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}

fn compile_patterns(patterns: Vec<String>) -> Result<Vec<Regex>, TrustFilterError> {
    patterns
        .into_iter()
        .map(|pattern| {
            Regex::new(&pattern).map_err(|source| TrustFilterError::InvalidPattern {
                pattern,
                source,
            })
        })
        .collect()
}
