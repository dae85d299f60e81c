//! Identity Toolkit and Secure Token endpoints.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use corner_shop_core::{Email, UserId};

use super::{FirebaseGateway, check};
use crate::gateway::{AuthSession, Authenticator, GatewayError, IdToken, RefreshToken, TokenRefresh};

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

// =============================================================================
// Authenticator
// =============================================================================

impl FirebaseGateway {
    fn accounts_url(&self, method: &str) -> String {
        format!(
            "{}/v1/accounts:{method}?key={}",
            self.inner.auth_url,
            urlencoding::encode(&self.inner.api_key)
        )
    }

    async fn password_call(
        &self,
        method: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, GatewayError> {
        let body = PasswordRequest {
            email: email.as_str(),
            password: password.expose_secret(),
            return_secure_token: true,
        };

        let response = self
            .client()
            .post(self.accounts_url(method))
            .json(&body)
            .send()
            .await?;
        let response: PasswordResponse = check(response, describe_auth_error).await?.json().await?;

        Ok(AuthSession {
            uid: UserId::new(response.local_id),
            email: email.clone(),
            display_name: response.display_name.filter(|n| !n.is_empty()),
            id_token: IdToken::new(response.id_token),
            refresh_token: RefreshToken::new(response.refresh_token),
            expires_in: parse_expires_in(&response.expires_in)?,
        })
    }
}

#[async_trait]
impl Authenticator for FirebaseGateway {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, GatewayError> {
        self.password_call("signInWithPassword", email, password).await
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, GatewayError> {
        self.password_call("signUp", email, password).await
    }

    #[instrument(skip(self, token))]
    async fn update_profile(
        &self,
        token: &IdToken,
        display_name: &str,
    ) -> Result<(), GatewayError> {
        let body = UpdateProfileRequest {
            id_token: token.expose(),
            display_name,
            return_secure_token: false,
        };

        let response = self
            .client()
            .post(self.accounts_url("update"))
            .json(&body)
            .send()
            .await?;
        check(response, describe_auth_error).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn send_password_reset(&self, email: &Email) -> Result<(), GatewayError> {
        let body = OobCodeRequest {
            request_type: "PASSWORD_RESET",
            email: email.as_str(),
        };

        let response = self
            .client()
            .post(self.accounts_url("sendOobCode"))
            .json(&body)
            .send()
            .await?;
        check(response, describe_auth_error).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenRefresh, GatewayError> {
        let url = format!(
            "{}/v1/token?key={}",
            self.inner.token_url,
            urlencoding::encode(&self.inner.api_key)
        );
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose()),
        ];

        let response = self.client().post(&url).form(&params).send().await?;
        let response: TokenResponse = check(response, describe_auth_error).await?.json().await?;

        Ok(TokenRefresh {
            id_token: IdToken::new(response.id_token),
            refresh_token: RefreshToken::new(response.refresh_token),
            expires_in: parse_expires_in(&response.expires_in)?,
        })
    }
}

fn parse_expires_in(raw: &str) -> Result<i64, GatewayError> {
    raw.parse()
        .map_err(|_| GatewayError::Decode(format!("expiresIn is not a number: {raw:?}")))
}

/// Turn an Identity Toolkit error code into a message fit for the user.
///
/// Codes look like `WEAK_PASSWORD : Password should be at least 6 characters`;
/// when a detail follows the code it is used for unknown codes.
pub(super) fn describe_auth_error(raw: &str) -> String {
    let (code, detail) = match raw.split_once(" : ") {
        Some((code, detail)) => (code.trim(), Some(detail.trim())),
        None => (raw.trim(), None),
    };

    let known = match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password"
        }
        "USER_DISABLED" => "This account has been disabled",
        "EMAIL_EXISTS" => "An account with this email already exists",
        "INVALID_EMAIL" => "Enter a valid email address",
        "WEAK_PASSWORD" => "Password should be at least 6 characters",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts, try again later",
        "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            "Your session has expired, please sign in again"
        }
        _ => return detail.unwrap_or(code).to_string(),
    };
    known.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_known_codes() {
        assert_eq!(
            describe_auth_error("INVALID_LOGIN_CREDENTIALS"),
            "Invalid email or password"
        );
        assert_eq!(
            describe_auth_error("EMAIL_EXISTS"),
            "An account with this email already exists"
        );
        assert_eq!(
            describe_auth_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            "Password should be at least 6 characters"
        );
    }

    #[test]
    fn test_describe_unknown_codes() {
        assert_eq!(
            describe_auth_error("OPERATION_NOT_ALLOWED : Password sign-in is disabled"),
            "Password sign-in is disabled"
        );
        assert_eq!(describe_auth_error("QUOTA_EXCEEDED"), "QUOTA_EXCEEDED");
    }

    #[test]
    fn test_parse_expires_in() {
        assert_eq!(parse_expires_in("3600").unwrap_or_default(), 3600);
        assert!(parse_expires_in("soon").is_err());
    }
}
