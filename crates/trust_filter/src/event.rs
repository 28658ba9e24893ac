//! Typed webhook event payloads.
//!
//! The hosting platform sends an envelope of `{"event": <kind>, "data":
//! {...}}`. The event kind is matched exactly once, here, producing a
//! closed enum the rest of the pipeline matches exhaustively.

use serde::Deserialize;
use thiserror::Error;

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

/// Failure to decode an inbound payload.
#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("webhook payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An inbound webhook delivery, decoded once at ingress.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    /// A pull request was opened.
    PullRequestCreated(PullRequestEvent),
    /// A comment was added to a pull request.
    CommentCreated(CommentEvent),
    /// A kind this receiver does not handle; dropped with a log.
    Unsupported { kind: String },
}

impl WebhookEvent {
    /// Decode a raw webhook body.
    ///
    /// Unknown event kinds decode to [`WebhookEvent::Unsupported`] rather
    /// than an error; only malformed JSON fails.
    pub fn decode(body: &[u8]) -> Result<Self, EventDecodeError> {
        let envelope: Envelope = serde_json::from_slice(body)?;
        match envelope.event.as_str() {
            "pullrequest:created" => Ok(Self::PullRequestCreated(serde_json::from_value(
                envelope.data,
            )?)),
            "pullrequest:comment_created" => {
                Ok(Self::CommentCreated(serde_json::from_value(envelope.data)?))
            }
            other => Ok(Self::Unsupported {
                kind: other.to_string(),
            }),
        }
    }

    /// Stable kind name for logging.
    pub fn kind(&self) -> &str {
        match self {
            Self::PullRequestCreated(_) => "pullrequest:created",
            Self::CommentCreated(_) => "pullrequest:comment_created",
            Self::Unsupported { kind } => kind,
        }
    }

    /// The actor that triggered the event, if present in the payload.
    pub fn actor(&self) -> Option<&Actor> {
        match self {
            Self::PullRequestCreated(e) => e.actor.as_ref(),
            Self::CommentCreated(e) => e.actor.as_ref(),
            Self::Unsupported { .. } => None,
        }
    }

    /// The pull request the event concerns, if any.
    pub fn pull_request(&self) -> Option<&PullRequest> {
        match self {
            Self::PullRequestCreated(e) => Some(&e.pullrequest),
            Self::CommentCreated(e) => Some(&e.pullrequest),
            Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Payload of a `pullrequest:created` event.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub actor: Option<Actor>,
    pub pullrequest: PullRequest,
}

/// Payload of a `pullrequest:comment_created` event.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentEvent {
    pub actor: Option<Actor>,
    pub pullrequest: PullRequest,
    pub comment: Comment,
}

impl CommentEvent {
    /// Raw comment text, empty when the payload omits it.
    pub fn body(&self) -> &str {
        self.comment
            .content
            .as_ref()
            .map(|c| c.raw.as_str())
            .unwrap_or("")
    }
}

/// The account that triggered an event.
#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    /// Declared actor type; anything other than `user` is bot-originated.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub nickname: Option<String>,
    pub account_id: Option<String>,
}

impl Actor {
    /// Best-effort display name: username, then display name, then
    /// nickname.
    pub fn name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.display_name.as_deref())
            .or(self.nickname.as_deref())
            .unwrap_or("")
    }
}

/// Pull request description embedded in event payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub title: Option<String>,
    pub source: Option<BranchRef>,
    pub destination: Option<BranchRef>,
    pub links: Option<Links>,
}

impl PullRequest {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn source_branch(&self) -> &str {
        branch_name(self.source.as_ref())
    }

    pub fn destination_branch(&self) -> &str {
        branch_name(self.destination.as_ref())
    }

    /// Browser URL of the pull request, used both for allow-list matching
    /// and as the target resource handed to the processor.
    pub fn html_url(&self) -> Option<&str> {
        self.links
            .as_ref()?
            .html
            .as_ref()
            .map(|link| link.href.as_str())
    }
}

fn branch_name(endpoint: Option<&BranchRef>) -> &str {
    endpoint
        .and_then(|e| e.branch.as_ref())
        .map(|b| b.name.as_str())
        .unwrap_or("")
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRef {
    pub branch: Option<Branch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Links {
    pub html: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub content: Option<CommentContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentContent {
    pub raw: String,
}

/// Tenant-install lifecycle callback payload.
///
/// Delivered to `POST /installed` when a tenant installs the app; carries
/// the shared secret used to verify that tenant's future webhooks.
///
/// Deliberately does not implement `Debug`: the shared secret must never
/// end up in logs.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledPayload {
    pub shared_secret: String,
    pub client_key: String,
    pub principal: Option<Principal>,
}

/// Tenant-uninstall lifecycle callback payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UninstalledPayload {
    pub client_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Principal {
    pub username: Option<String>,
}
