//! Cart inspection commands.
//!
//! Reads a session record straight from the session table and prints the
//! cart blob it holds.
//!
//! # Usage
//!
//! ```bash
//! cs-cli cart show --session-id <id>
//! ```

use std::str::FromStr;

use secrecy::ExposeSecret;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::SessionStore;
use tower_sessions::session::Id;
use tower_sessions_sqlx_store::PostgresStore;

use corner_shop_core::{Cart, CartError};
use corner_shop_storefront::cart_store::CART_KEY;
use corner_shop_storefront::config::{ConfigError, database_url_from_env};

/// Errors that can occur while inspecting a cart.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Database URL is not configured.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session store error.
    #[error("Session store error: {0}")]
    Store(#[from] tower_sessions::session_store::Error),

    /// The session id is not a valid id.
    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    /// No live session has this id.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The cart value is not a string.
    #[error("Cart value is not a string")]
    NotABlob,

    /// The cart blob is unreadable.
    #[error("Stored cart is unreadable: {0}")]
    Malformed(#[from] CartError),
}

/// Print the cart stored in a session.
///
/// # Errors
///
/// Returns an error if the session cannot be found or its cart is unreadable.
pub async fn show(session_id: &str) -> Result<(), CartCommandError> {
    dotenvy::dotenv().ok();

    let id = Id::from_str(session_id)
        .map_err(|_| CartCommandError::InvalidSessionId(session_id.to_owned()))?;

    let database_url = database_url_from_env()?;
    let pool = PgPool::connect(database_url.expose_secret()).await?;
    let store = PostgresStore::new(pool);

    let record = store
        .load(&id)
        .await?
        .ok_or_else(|| CartCommandError::SessionNotFound(session_id.to_owned()))?;

    let cart = match record.data.get(CART_KEY) {
        Some(value) => cart_from_value(value)?,
        None => Cart::new(),
    };

    if cart.is_empty() {
        tracing::info!("Cart is empty");
        return Ok(());
    }

    for entry in cart.entries() {
        tracing::info!(
            "{} x {} ({}) = {}",
            entry.quantity,
            entry.product.name,
            entry.product.id,
            entry.line_total()
        );
    }
    tracing::info!(
        "{} items, subtotal {}",
        cart.total_quantity(),
        cart.subtotal()
    );

    Ok(())
}

/// Decode the session value stored under the cart key.
fn cart_from_value(value: &Value) -> Result<Cart, CartCommandError> {
    let blob = value.as_str().ok_or(CartCommandError::NotABlob)?;
    Ok(Cart::from_blob(blob)?)
}
