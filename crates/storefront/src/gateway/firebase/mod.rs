//! Firebase REST client.
//!
//! One [`FirebaseGateway`] implements all three gateway capabilities:
//!
//! - [`DocumentStore`](crate::gateway::DocumentStore) via Firestore v1
//! - [`FileStorage`](crate::gateway::FileStorage) via Firebase Storage v0
//! - [`Authenticator`](crate::gateway::Authenticator) via Identity Toolkit v1
//!   and the Secure Token service
//!
//! Endpoint base URLs come from [`FirebaseConfig`] so the emulators can be
//! targeted instead of production.

mod auth;
mod firestore;
mod storage;
pub mod value;

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::config::FirebaseConfig;
use crate::gateway::GatewayError;

pub use storage::storage_path_from_url;

// =============================================================================
// FirebaseGateway
// =============================================================================

/// Client for the Firebase REST APIs.
#[derive(Clone)]
pub struct FirebaseGateway {
    inner: Arc<FirebaseGatewayInner>,
}

struct FirebaseGatewayInner {
    client: reqwest::Client,
    api_key: String,
    auth_url: String,
    token_url: String,
    documents_url: String,
    objects_url: String,
}

impl FirebaseGateway {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        let documents_url = format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            config.firestore_url, config.project_id
        );
        let objects_url = format!("{}/v0/b/{}/o", config.storage_url, config.storage_bucket);

        Self {
            inner: Arc::new(FirebaseGatewayInner {
                client: reqwest::Client::new(),
                api_key: config.api_key().to_string(),
                auth_url: config.auth_url.clone(),
                token_url: config.token_url.clone(),
                documents_url,
                objects_url,
            }),
        }
    }

    fn client(&self) -> &reqwest::Client {
        &self.inner.client
    }
}

impl std::fmt::Debug for FirebaseGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseGateway")
            .field("documents_url", &self.inner.documents_url)
            .field("objects_url", &self.inner.objects_url)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Error Responses
// =============================================================================

/// Error body shared by the Firebase REST APIs.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Pass successful responses through; turn anything else into
/// [`GatewayError::Provider`] with the message mapped by `describe`.
async fn check(
    response: reqwest::Response,
    describe: fn(&str) -> String,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    debug!(status = %status, body = %text, "Firebase request failed");

    let message = serde_json::from_str::<ErrorResponse>(&text)
        .ok()
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .map_or_else(
            || {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            },
            |m| describe(&m),
        );

    Err(GatewayError::Provider {
        status: status.as_u16(),
        message,
    })
}

/// Provider messages that need no translation.
fn verbatim(message: &str) -> String {
    message.to_string()
}
