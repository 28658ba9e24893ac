//! Tests for webhook event decoding

use super::*;
use serde_json::json;

fn pr_created_body() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "event": "pullrequest:created",
        "data": {
            "actor": {
                "type": "user",
                "username": "mreynolds",
                "account_id": "557058:abc"
            },
            "pullrequest": {
                "title": "Add retry handling",
                "source": {"branch": {"name": "feature/retries"}},
                "destination": {"branch": {"name": "main"}},
                "links": {"html": {"href": "https://bitbucket.org/acme/widgets/pull-requests/7"}}
            }
        }
    }))
    .unwrap()
}

#[test]
fn decodes_pull_request_created() {
    let event = WebhookEvent::decode(&pr_created_body()).unwrap();

    let WebhookEvent::PullRequestCreated(payload) = &event else {
        panic!("expected PullRequestCreated, got {}", event.kind());
    };

    assert_eq!(payload.pullrequest.title(), "Add retry handling");
    assert_eq!(payload.pullrequest.source_branch(), "feature/retries");
    assert_eq!(payload.pullrequest.destination_branch(), "main");
    assert_eq!(
        payload.pullrequest.html_url(),
        Some("https://bitbucket.org/acme/widgets/pull-requests/7")
    );
    assert_eq!(event.actor().unwrap().name(), "mreynolds");
}

#[test]
fn decodes_comment_created() {
    let body = serde_json::to_vec(&json!({
        "event": "pullrequest:comment_created",
        "data": {
            "actor": {"type": "user", "display_name": "River"},
            "pullrequest": {
                "title": "Fix bug",
                "links": {"html": {"href": "https://bitbucket.org/acme/widgets/pull-requests/9"}}
            },
            "comment": {"content": {"raw": "/review please"}}
        }
    }))
    .unwrap();

    let event = WebhookEvent::decode(&body).unwrap();
    let WebhookEvent::CommentCreated(payload) = &event else {
        panic!("expected CommentCreated");
    };

    assert_eq!(payload.body(), "/review please");
    // Falls back to display_name when username is missing.
    assert_eq!(event.actor().unwrap().name(), "River");
}

#[test]
fn unknown_kind_decodes_to_unsupported() {
    let body = serde_json::to_vec(&json!({
        "event": "repo:push",
        "data": {"anything": true}
    }))
    .unwrap();

    let event = WebhookEvent::decode(&body).unwrap();
    assert!(matches!(event, WebhookEvent::Unsupported { ref kind } if kind == "repo:push"));
    assert!(event.actor().is_none());
    assert!(event.pull_request().is_none());
}

#[test]
fn missing_event_field_is_unsupported_not_an_error() {
    let body = serde_json::to_vec(&json!({"data": {}})).unwrap();

    let event = WebhookEvent::decode(&body).unwrap();
    assert!(matches!(event, WebhookEvent::Unsupported { ref kind } if kind.is_empty()));
}

#[test]
fn malformed_json_is_a_decode_error() {
    assert!(WebhookEvent::decode(b"{not json").is_err());
}

#[test]
fn actor_name_resolution_order() {
    let actor: Actor = serde_json::from_value(json!({
        "type": "user",
        "display_name": "Display",
        "nickname": "nick"
    }))
    .unwrap();
    assert_eq!(actor.name(), "Display");

    let actor: Actor = serde_json::from_value(json!({"type": "user", "nickname": "nick"})).unwrap();
    assert_eq!(actor.name(), "nick");

    let actor: Actor = serde_json::from_value(json!({"type": "user"})).unwrap();
    assert_eq!(actor.name(), "");
}

#[test]
fn installed_payload_uses_camel_case_keys() {
    let payload: InstalledPayload = serde_json::from_value(json!({
        "sharedSecret": "abc123",
        "clientKey": "tenant-1",
        "principal": {"username": "kaylee"}
    }))
    .unwrap();

    assert_eq!(payload.shared_secret, "abc123");
    assert_eq!(payload.client_key, "tenant-1");
    assert_eq!(payload.principal.unwrap().username.as_deref(), Some("kaylee"));
}

#[test]
fn sparse_pull_request_payload_decodes() {
    let event = WebhookEvent::decode(
        &serde_json::to_vec(&json!({
            "event": "pullrequest:created",
            "data": {"pullrequest": {}}
        }))
        .unwrap(),
    )
    .unwrap();

    let pr = event.pull_request().unwrap();
    assert_eq!(pr.title(), "");
    assert_eq!(pr.source_branch(), "");
    assert!(pr.html_url().is_none());
}
