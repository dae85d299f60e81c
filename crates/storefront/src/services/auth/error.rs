//! Authentication error types.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur during authentication operations.
///
/// The `Display` text is shown to the user.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] corner_shop_core::EmailError),

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// Display name missing.
    #[error("Name is required")]
    MissingName,

    /// The gateway rejected the request or could not be reached.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
