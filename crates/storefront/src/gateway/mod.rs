//! Remote data gateway: document store, file storage and authentication.
//!
//! # Architecture
//!
//! - The backend-as-a-service is the source of truth for products and
//!   accounts - NO local copy beyond what a single request renders
//! - Every capability is an object-safe trait so handlers work against
//!   `Arc<dyn ...>` and tests swap in `memory::MemoryGateway`
//! - Records cross the boundary as JSON field maps and are decoded into
//!   typed structs with serde ([`Document::decode`], [`encode`])
//!
//! # Implementations
//!
//! - [`firebase::FirebaseGateway`] - Firestore, Firebase Storage and
//!   Identity Toolkit REST APIs over `reqwest`
//! - `memory::MemoryGateway` - in-process maps with failure injection
//!   (`test-support` feature)
//!
//! # Example
//!
//! ```rust,ignore
//! let gateway = Gateway::firebase(&config.firebase);
//!
//! let session = gateway.auth.sign_in(&email, &password).await?;
//! let docs = gateway
//!     .documents
//!     .list(&session.id_token, &paths::user_products(&session.uid))
//!     .await?;
//! ```

pub mod data_url;
pub mod firebase;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod paths;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use corner_shop_core::{Email, UserId};

use crate::config::FirebaseConfig;

pub use data_url::DataUrl;

/// Field map of a stored record.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur when talking to the remote data gateway.
///
/// The `Display` text of [`GatewayError::Provider`] is the provider's own
/// message; it is shown to the user as-is.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed before a response arrived.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request.
    #[error("{message}")]
    Provider {
        /// HTTP status returned by the provider.
        status: u16,
        /// Human-readable message.
        message: String,
    },

    /// A record that must exist does not.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A file URL could not be resolved to a storage path.
    #[error("Invalid file reference: {0}")]
    InvalidFileUrl(String),

    /// An upload payload is not a usable data URL.
    #[error("Invalid image data: {0}")]
    InvalidDataUrl(String),

    /// A record does not have the expected shape.
    #[error("Unexpected record shape: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Whether the provider reported the target as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Provider { status: 404, .. })
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Short-lived ID token proving who the caller is.
///
/// `Debug` is redacted; the raw value is only reachable via [`IdToken::expose`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdToken(String);

impl IdToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token for an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdToken([REDACTED])")
    }
}

/// Long-lived token exchanged for fresh ID tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token for the token exchange.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken([REDACTED])")
    }
}

/// Result of a successful sign-in or sign-up.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Account uid.
    pub uid: UserId,
    /// Account email.
    pub email: Email,
    /// Profile display name, if one is set.
    pub display_name: Option<String>,
    /// ID token for subsequent requests.
    pub id_token: IdToken,
    /// Refresh token.
    pub refresh_token: RefreshToken,
    /// Seconds until `id_token` expires.
    pub expires_in: i64,
}

/// Result of exchanging a refresh token.
#[derive(Debug, Clone)]
pub struct TokenRefresh {
    /// New ID token.
    pub id_token: IdToken,
    /// Possibly rotated refresh token.
    pub refresh_token: RefreshToken,
    /// Seconds until `id_token` expires.
    pub expires_in: i64,
}

// =============================================================================
// Records
// =============================================================================

/// A stored record: its id (last path segment) and its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id.
    pub id: String,
    /// Stored fields.
    pub fields: Fields,
}

impl Document {
    /// Decode into a typed record, exposing the document id as field `id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Decode`] if the fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), serde_json::Value::String(self.id.clone()));
        serde_json::from_value(serde_json::Value::Object(fields))
            .map_err(|e| GatewayError::Decode(format!("document {}: {e}", self.id)))
    }
}

/// Encode a typed record as a field map.
///
/// # Errors
///
/// Returns [`GatewayError::Decode`] if `value` does not serialize to a JSON object.
pub fn encode<T: Serialize>(value: &T) -> Result<Fields, GatewayError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(GatewayError::Decode(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(GatewayError::Decode(e.to_string())),
    }
}

// =============================================================================
// Capabilities
// =============================================================================

/// Hierarchical document store (collections of documents addressed by path).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents directly inside `collection`.
    async fn list(&self, token: &IdToken, collection: &str)
    -> Result<Vec<Document>, GatewayError>;

    /// The document at `path`, or `None` if it does not exist.
    async fn get(&self, token: &IdToken, path: &str) -> Result<Option<Document>, GatewayError>;

    /// Create a document with a gateway-assigned id.
    async fn add(
        &self,
        token: &IdToken,
        collection: &str,
        fields: Fields,
    ) -> Result<Document, GatewayError>;

    /// Create or replace the document at `path`.
    async fn set(&self, token: &IdToken, path: &str, fields: Fields) -> Result<(), GatewayError>;

    /// Merge `fields` into the existing document at `path`; fails if missing.
    async fn update(&self, token: &IdToken, path: &str, fields: Fields)
    -> Result<(), GatewayError>;

    /// Delete the document at `path`.
    async fn delete(&self, token: &IdToken, path: &str) -> Result<(), GatewayError>;
}

/// Blob store addressed by path, serving files through download URLs.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Upload a `data:` URL to `path` and return its download URL.
    async fn upload_data_url(
        &self,
        token: &IdToken,
        path: &str,
        data_url: &str,
    ) -> Result<String, GatewayError>;

    /// Resolve a download URL (or bare path) back to its storage path.
    fn path_from_url(&self, url: &str) -> Result<String, GatewayError>;

    /// Delete the file at `path`.
    async fn delete(&self, token: &IdToken, path: &str) -> Result<(), GatewayError>;
}

/// Email/password account provider.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Sign in to an existing account.
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, GatewayError>;

    /// Create an account and sign in to it.
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, GatewayError>;

    /// Set the profile display name of the signed-in account.
    async fn update_profile(&self, token: &IdToken, display_name: &str)
    -> Result<(), GatewayError>;

    /// Send a password-reset email.
    async fn send_password_reset(&self, email: &Email) -> Result<(), GatewayError>;

    /// Exchange a refresh token for a fresh ID token.
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenRefresh, GatewayError>;
}

/// The three gateway capabilities bundled for application state.
#[derive(Clone)]
pub struct Gateway {
    /// Document store.
    pub documents: Arc<dyn DocumentStore>,
    /// File storage.
    pub files: Arc<dyn FileStorage>,
    /// Account provider.
    pub auth: Arc<dyn Authenticator>,
}

impl Gateway {
    /// Gateway backed by the Firebase REST APIs.
    #[must_use]
    pub fn firebase(config: &FirebaseConfig) -> Self {
        let client = firebase::FirebaseGateway::new(config);
        Self {
            documents: Arc::new(client.clone()),
            files: Arc::new(client.clone()),
            auth: Arc::new(client),
        }
    }

    /// Gateway backed by in-process maps.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn memory(gateway: &memory::MemoryGateway) -> Self {
        Self {
            documents: Arc::new(gateway.clone()),
            files: Arc::new(gateway.clone()),
            auth: Arc::new(gateway.clone()),
        }
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use corner_shop_core::{Price, Product, ProductDraft, ProductId};

    use super::*;

    #[test]
    fn test_decode_injects_document_id() {
        let doc = Document {
            id: "abc".to_string(),
            fields: json!({"name": "Termo", "price": 15, "soldUnits": 3})
                .as_object()
                .unwrap()
                .clone(),
        };

        let product: Product = doc.decode().unwrap();
        assert_eq!(product.id, ProductId::new("abc"));
        assert_eq!(product.price, Price::from_cents(1500));
        assert_eq!(product.sold_units, 3);
    }

    #[test]
    fn test_decode_reports_shape_errors() {
        let doc = Document {
            id: "abc".to_string(),
            fields: json!({"name": 42}).as_object().unwrap().clone(),
        };

        let err = doc.decode::<Product>().unwrap_err();
        assert!(matches!(err, GatewayError::Decode(msg) if msg.contains("abc")));
    }

    #[test]
    fn test_encode_draft() {
        let draft = ProductDraft {
            name: "Termo".to_string(),
            price: Price::from_cents(1550),
            sold_units: 1,
            image: "https://img".to_string(),
        };

        let fields = encode(&draft).unwrap();
        assert_eq!(fields["name"], "Termo");
        assert_eq!(fields["price"], 15.5);
        assert!(!fields.contains_key("id"));
    }

    #[test]
    fn test_encode_rejects_non_objects() {
        assert!(matches!(encode(&3), Err(GatewayError::Decode(_))));
    }

    #[test]
    fn test_tokens_are_redacted_in_debug() {
        let token = IdToken::new("eyJhbGciOi.secret");
        assert_eq!(format!("{token:?}"), "IdToken([REDACTED])");
        assert_eq!(token.expose(), "eyJhbGciOi.secret");
    }

    #[test]
    fn test_provider_error_displays_message_only() {
        let err = GatewayError::Provider {
            status: 403,
            message: "Missing or insufficient permissions.".to_string(),
        };
        assert_eq!(err.to_string(), "Missing or insufficient permissions.");
        assert!(!err.is_not_found());
    }
}
