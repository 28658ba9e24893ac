//! Tenant descriptor document.
//!
//! Served at `GET /` so the hosting platform can discover this instance's
//! identity, lifecycle callbacks, and webhook subscriptions. Templated
//! with the configured app key and base URL.

use serde_json::json;

use crate::config::ServerConfig;

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;

/// Build the descriptor for this instance.
pub fn descriptor(config: &ServerConfig) -> serde_json::Value {
    json!({
        "key": config.app_key,
        "name": "ReviewRelay",
        "description": "Automated pull request review",
        "vendor": {
            "name": "ReviewRelay",
            "url": config.base_url,
        },
        "baseUrl": config.base_url,
        "authentication": {
            "type": "jwt"
        },
        "lifecycle": {
            "installed": "/installed",
            "uninstalled": "/uninstalled"
        },
        "scopes": ["account", "repository", "pullrequest"],
        "contexts": ["account"],
        "modules": {
            "webhooks": [
                {
                    "event": "pullrequest:created",
                    "url": "/webhook"
                },
                {
                    "event": "pullrequest:comment_created",
                    "url": "/webhook"
                }
            ]
        }
    })
}
