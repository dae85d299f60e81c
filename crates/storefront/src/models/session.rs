//! Session-related types.
//!
//! Types stored in the session for authentication state.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use corner_shop_core::{Email, UserId};

use crate::gateway::{AuthSession, IdToken, RefreshToken, TokenRefresh};

/// How close to expiry an ID token is refreshed.
pub const REFRESH_WINDOW_SECS: i64 = 5 * 60;

/// Session-stored user identity.
///
/// Carries the gateway tokens so every user-scoped call can be authorized.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Account uid.
    pub uid: UserId,
    /// Account email.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// ID token for gateway calls.
    pub id_token: IdToken,
    /// Token used to obtain a new `id_token`.
    pub refresh_token: RefreshToken,
    /// When `id_token` expires.
    pub expires_at: DateTime<Utc>,
}

impl CurrentUser {
    /// Build the session user from a fresh sign-in.
    #[must_use]
    pub fn from_auth(auth: AuthSession, name: String, now: DateTime<Utc>) -> Self {
        Self {
            uid: auth.uid,
            email: auth.email,
            name,
            id_token: auth.id_token,
            refresh_token: auth.refresh_token,
            expires_at: now + Duration::seconds(auth.expires_in),
        }
    }

    /// Whether the ID token expires within [`REFRESH_WINDOW_SECS`] of `now`.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now <= Duration::seconds(REFRESH_WINDOW_SECS)
    }

    /// A copy carrying refreshed tokens.
    #[must_use]
    pub fn with_tokens(&self, refresh: TokenRefresh, now: DateTime<Utc>) -> Self {
        Self {
            id_token: refresh.id_token,
            refresh_token: refresh.refresh_token,
            expires_at: now + Duration::seconds(refresh.expires_in),
            ..self.clone()
        }
    }
}

impl fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentUser")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Account record stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account uid.
    pub uid: UserId,
    /// Account email.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";
}
