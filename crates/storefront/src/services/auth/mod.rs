//! Authentication service.
//!
//! Email/password accounts live with the gateway's account provider; the
//! display name is mirrored in the `users/{uid}` document.

mod error;

pub use error::AuthError;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use corner_shop_core::Email;

use crate::gateway::{Gateway, encode, paths};
use crate::models::{CurrentUser, UserProfile};

/// Minimum password length accepted by the account provider.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication service.
pub struct AuthService<'a> {
    gateway: &'a Gateway,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    // =========================================================================
    // Sign In / Sign Up
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// The display name comes from `users/{uid}`, falling back to the
    /// provider profile and then the email's local part.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed email and
    /// `AuthError::Gateway` when the provider rejects the credentials.
    #[instrument(skip(self, password, now))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        let auth = self.gateway.auth.sign_in(&email, password).await?;

        let stored_name = self
            .gateway
            .documents
            .get(&auth.id_token, &paths::user(&auth.uid))
            .await?
            .and_then(|doc| match doc.decode::<UserProfile>() {
                Ok(profile) => Some(profile.name),
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable user document");
                    None
                }
            })
            .filter(|name| !name.trim().is_empty());

        let name = stored_name
            .or_else(|| auth.display_name.clone())
            .unwrap_or_else(|| email.local_part().to_string());

        info!(uid = %auth.uid, "User signed in");
        Ok(CurrentUser::from_auth(auth, name, now))
    }

    /// Create an account, set its display name and write `users/{uid}`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName`, `AuthError::InvalidEmail` or
    /// `AuthError::WeakPassword` for bad input, `AuthError::Gateway` if any
    /// provider step fails.
    #[instrument(skip(self, password, now))]
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<CurrentUser, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(email)?;
        validate_password(password)?;

        let auth = self.gateway.auth.sign_up(&email, password).await?;
        self.gateway
            .auth
            .update_profile(&auth.id_token, name)
            .await?;

        let profile = UserProfile {
            uid: auth.uid.clone(),
            email: email.as_str().to_string(),
            name: name.to_string(),
        };
        self.gateway
            .documents
            .set(&auth.id_token, &paths::user(&auth.uid), encode(&profile)?)
            .await?;

        info!(uid = %auth.uid, "User signed up");
        Ok(CurrentUser::from_auth(auth, name.to_string(), now))
    }

    /// Send a password-reset email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::Gateway`.
    #[instrument(skip(self))]
    pub async fn send_recovery_email(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        self.gateway.auth.send_password_reset(&email).await?;
        Ok(())
    }

    // =========================================================================
    // Signed-in User
    // =========================================================================

    /// Exchange the refresh token when the ID token is about to expire.
    ///
    /// Returns `None` when the current token is still fresh.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Gateway` if the exchange fails.
    #[instrument(skip_all, fields(uid = %user.uid))]
    pub async fn refresh_if_needed(
        &self,
        user: &CurrentUser,
        now: DateTime<Utc>,
    ) -> Result<Option<CurrentUser>, AuthError> {
        if !user.needs_refresh(now) {
            return Ok(None);
        }

        let refresh = self.gateway.auth.refresh(&user.refresh_token).await?;
        Ok(Some(user.with_tokens(refresh, now)))
    }

    /// Change the display name on the account and in `users/{uid}`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName` or `AuthError::Gateway`.
    #[instrument(skip_all, fields(uid = %user.uid))]
    pub async fn update_display_name(
        &self,
        user: &CurrentUser,
        name: &str,
    ) -> Result<CurrentUser, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }

        self.gateway
            .auth
            .update_profile(&user.id_token, name)
            .await?;

        let mut fields = crate::gateway::Fields::new();
        fields.insert("name".to_string(), serde_json::Value::from(name));
        self.gateway
            .documents
            .update(&user.id_token, &paths::user(&user.uid), fields)
            .await?;

        Ok(CurrentUser {
            name: name.to_string(),
            ..user.clone()
        })
    }
}

fn validate_password(password: &SecretString) -> Result<(), AuthError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password should be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::gateway::memory::{MemoryGateway, Operation};

    fn setup() -> (MemoryGateway, Gateway) {
        let memory = MemoryGateway::new();
        let gateway = Gateway::memory(&memory);
        (memory, gateway)
    }

    fn password(raw: &str) -> SecretString {
        SecretString::from(raw)
    }

    #[tokio::test]
    async fn test_sign_up_writes_profile_and_user_document() {
        let (memory, gateway) = setup();
        let service = AuthService::new(&gateway);

        let user = service
            .sign_up(" Ana ", "ana@example.com", &password("hunter22"), Utc::now())
            .await
            .unwrap();

        assert_eq!(user.name, "Ana");
        assert_eq!(memory.display_name(&user.uid).as_deref(), Some("Ana"));

        let doc = memory.document(&paths::user(&user.uid)).unwrap();
        assert_eq!(doc["email"], "ana@example.com");
        assert_eq!(doc["name"], "Ana");
        assert_eq!(doc["uid"], user.uid.as_str());
    }

    #[tokio::test]
    async fn test_sign_up_validates_before_calling_gateway() {
        let (memory, gateway) = setup();
        let service = AuthService::new(&gateway);
        let now = Utc::now();

        assert!(matches!(
            service.sign_up("", "ana@example.com", &password("hunter22"), now).await,
            Err(AuthError::MissingName)
        ));
        assert!(matches!(
            service.sign_up("Ana", "not-an-email", &password("hunter22"), now).await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            service.sign_up("Ana", "ana@example.com", &password("123"), now).await,
            Err(AuthError::WeakPassword(_))
        ));
        assert!(memory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_reads_name_from_user_document() {
        let (_memory, gateway) = setup();
        let service = AuthService::new(&gateway);
        let now = Utc::now();
        service
            .sign_up("Ana", "ana@example.com", &password("hunter22"), now)
            .await
            .unwrap();

        let user = service
            .sign_in("ana@example.com", &password("hunter22"), now)
            .await
            .unwrap();

        assert_eq!(user.name, "Ana");
        assert_eq!(user.expires_at, now + Duration::hours(1));
    }

    #[tokio::test]
    async fn test_sign_in_falls_back_to_email_local_part() {
        let (memory, gateway) = setup();
        let email = Email::parse("bob@example.com").unwrap();
        memory.add_account(&email, "secret-pass", None);

        let user = AuthService::new(&gateway)
            .sign_in("bob@example.com", &password("secret-pass"), Utc::now())
            .await
            .unwrap();

        assert_eq!(user.name, "bob");
    }

    #[tokio::test]
    async fn test_sign_in_surfaces_provider_message() {
        let (_memory, gateway) = setup();

        let err = AuthService::new(&gateway)
            .sign_in("nobody@example.com", &password("whatever"), Utc::now())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_send_recovery_email() {
        let (memory, gateway) = setup();
        let email = Email::parse("ana@example.com").unwrap();
        memory.add_account(&email, "secret-pass", None);

        AuthService::new(&gateway)
            .send_recovery_email("ana@example.com")
            .await
            .unwrap();

        assert_eq!(memory.password_resets(), ["ana@example.com"]);
    }

    #[tokio::test]
    async fn test_refresh_only_near_expiry() {
        let (memory, gateway) = setup();
        let service = AuthService::new(&gateway);
        let now = Utc::now();
        let user = service
            .sign_up("Ana", "ana@example.com", &password("hunter22"), now)
            .await
            .unwrap();
        memory.clear_calls();

        assert!(service.refresh_if_needed(&user, now).await.unwrap().is_none());
        assert!(memory.calls().is_empty());

        let later = now + Duration::minutes(56);
        let refreshed = service
            .refresh_if_needed(&user, later)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.expires_at, later + Duration::hours(1));
        assert_eq!(memory.operations(), [Operation::RefreshToken]);
    }

    #[tokio::test]
    async fn test_update_display_name() {
        let (memory, gateway) = setup();
        let service = AuthService::new(&gateway);
        let user = service
            .sign_up("Ana", "ana@example.com", &password("hunter22"), Utc::now())
            .await
            .unwrap();

        let updated = service.update_display_name(&user, "Ana María").await.unwrap();

        assert_eq!(updated.name, "Ana María");
        assert_eq!(memory.display_name(&user.uid).as_deref(), Some("Ana María"));
        assert_eq!(
            memory.document(&paths::user(&user.uid)).unwrap()["name"],
            "Ana María"
        );
    }
}
