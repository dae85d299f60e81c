//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! CS_USER_PASSWORD=... cs-cli user create -e ana@example.com -n "Ana"
//! ```
//!
//! # Environment Variables
//!
//! - `FIREBASE_API_KEY`, `FIREBASE_PROJECT_ID`, `FIREBASE_STORAGE_BUCKET`
//! - Optional emulator overrides, as for the storefront

use chrono::Utc;
use secrecy::SecretString;
use thiserror::Error;

use corner_shop_core::UserId;
use corner_shop_storefront::config::{ConfigError, FirebaseConfig};
use corner_shop_storefront::gateway::Gateway;
use corner_shop_storefront::services::auth::{AuthError, AuthService};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Firebase is not configured.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The provider rejected the account.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create an account, set its display name and write its profile document.
///
/// # Returns
///
/// The new account's uid.
///
/// # Errors
///
/// Returns an error if configuration is missing, the input is invalid or
/// the provider rejects the account.
pub async fn create(name: &str, email: &str, password: &SecretString) -> Result<UserId, UserError> {
    dotenvy::dotenv().ok();

    let config = FirebaseConfig::from_env()?;
    let gateway = Gateway::firebase(&config);

    tracing::info!("Creating account: {}", email);
    let user = AuthService::new(&gateway)
        .sign_up(name, email, password, Utc::now())
        .await?;

    tracing::info!(
        "Account created successfully! UID: {}, Email: {}, Name: {}",
        user.uid,
        user.email,
        user.name
    );
    Ok(user.uid)
}
