//! Integration tests for Corner Shop.
//!
//! Everything runs in-process: the remote gateway is the in-memory
//! implementation and sessions use the `tower-sessions` memory store, so no
//! database or Firebase project is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p corner-shop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Cart persistence over a key-value store
//! - `product_flows` - Product create/update/delete against the gateway
//! - `auth_flows` - Sign-up, sign-in, recovery and token refresh
//! - `router` - HTTP routes end to end

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use axum::Router;
use chrono::{Duration, Utc};
use secrecy::SecretString;
use serde_json::json;
use tower_sessions::MemoryStore;

use corner_shop_core::{Email, Price, Product, ProductDraft, ProductId, UserId};
use corner_shop_storefront::config::{FirebaseConfig, StorefrontConfig};
use corner_shop_storefront::gateway::memory::MemoryGateway;
use corner_shop_storefront::gateway::{Fields, Gateway, IdToken, RefreshToken, paths};
use corner_shop_storefront::middleware::configure_session_layer;
use corner_shop_storefront::models::CurrentUser;
use corner_shop_storefront::state::AppState;
use corner_shop_storefront::{db, routes};

/// Password used for every seeded account.
pub const PASSWORD: &str = "secret-pw";

/// Configuration pointing at nothing reachable; the gateway is swapped for
/// the in-memory one.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/corner_shop_test"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        firebase: FirebaseConfig {
            api_key: SecretString::from("test-api-key"),
            project_id: "corner-shop-test".to_string(),
            storage_bucket: "corner-shop-test.appspot.com".to_string(),
            auth_url: "http://localhost:9099/identitytoolkit.googleapis.com".to_string(),
            token_url: "http://localhost:9099/securetoken.googleapis.com".to_string(),
            firestore_url: "http://localhost:8080".to_string(),
            storage_url: "http://localhost:9199".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The full storefront router over `memory`, with in-memory sessions.
#[must_use]
pub fn test_app(memory: &MemoryGateway) -> Router {
    let config = test_config();
    let pool = db::create_lazy_pool(&config.database_url).unwrap();
    let state = AppState::with_gateway(config, pool, Gateway::memory(memory));

    routes::app(state, configure_session_layer(MemoryStore::default(), false))
}

/// A signed-in user as the in-memory gateway would issue it.
#[must_use]
pub fn signed_in(uid: &str) -> CurrentUser {
    CurrentUser {
        uid: UserId::new(uid),
        email: Email::parse("ana@example.com").unwrap(),
        name: "Ana".to_string(),
        id_token: IdToken::new(format!("memory-id-{uid}")),
        refresh_token: RefreshToken::new(format!("memory-refresh-{uid}")),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

/// A product with no image.
#[must_use]
pub fn product(id: &str, cents: i64) -> Product {
    Product::from_draft(
        ProductId::new(id),
        ProductDraft {
            name: format!("Product {id}"),
            price: Price::from_cents(cents),
            sold_units: 0,
            image: String::new(),
        },
    )
}

/// Seed a product document with a stored image; returns the image URL.
pub fn seed_product(memory: &MemoryGateway, uid: &UserId, id: &str, name: &str) -> String {
    let image_path = format!("{uid}/{id}");
    let image = memory.insert_file(&image_path, "image/png", b"\x89PNG");

    let mut fields = Fields::new();
    fields.insert("name".to_string(), json!(name));
    fields.insert("price".to_string(), json!(4.5));
    fields.insert("soldUnits".to_string(), json!(2));
    fields.insert("image".to_string(), json!(image));
    memory.insert_document(paths::user_product(uid, &ProductId::new(id)), fields);
    image
}
