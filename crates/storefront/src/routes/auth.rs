//! Authentication route handlers.
//!
//! Sign-in, sign-up, password recovery and sign-out against the identity
//! provider behind the gateway. The signed-in user lives in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::presentation::{Toast, push_toast, take_toasts};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Landing page after signing in.
const HOME_PATH: &str = "/products";

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Password recovery form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user_name: Option<String>,
    pub toasts: Vec<Toast>,
    pub email: String,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_up.html")]
pub struct SignUpTemplate {
    pub user_name: Option<String>,
    pub toasts: Vec<Toast>,
    pub name: String,
    pub email: String,
}

/// Password recovery page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub user_name: Option<String>,
    pub toasts: Vec<Toast>,
    pub email: String,
}

// =============================================================================
// Sign In
// =============================================================================

/// Display the sign-in page, or skip it when somebody is already signed in.
pub async fn login_page(OptionalAuth(user): OptionalAuth, session: Session) -> Response {
    if user.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }

    LoginTemplate {
        user_name: None,
        toasts: take_toasts(&session).await,
        email: String::new(),
    }
    .into_response()
}

/// Handle sign-in form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let password = SecretString::from(form.password);

    match AuthService::new(state.gateway())
        .sign_in(&form.email, &password, Utc::now())
        .await
    {
        Ok(user) => start_session(&session, &user, "Signed in").await,
        Err(e) => {
            warn!(error = %e, "Sign-in failed");
            LoginTemplate {
                user_name: None,
                toasts: vec![Toast::failure(e.to_string())],
                email: form.email,
            }
            .into_response()
        }
    }
}

// =============================================================================
// Sign Up
// =============================================================================

/// Display the sign-up page.
pub async fn sign_up_page(OptionalAuth(user): OptionalAuth, session: Session) -> Response {
    if user.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }

    SignUpTemplate {
        user_name: None,
        toasts: take_toasts(&session).await,
        name: String::new(),
        email: String::new(),
    }
    .into_response()
}

/// Handle sign-up form submission.
///
/// A new account is signed in straight away.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> Response {
    let password = SecretString::from(form.password);

    match AuthService::new(state.gateway())
        .sign_up(&form.name, &form.email, &password, Utc::now())
        .await
    {
        Ok(user) => {
            push_toast(&session, Toast::success(format!("Welcome, {}", user.name))).await;
            start_session(&session, &user, "Signed up").await
        }
        Err(e) => {
            warn!(error = %e, "Sign-up failed");
            SignUpTemplate {
                user_name: None,
                toasts: vec![Toast::failure(e.to_string())],
                name: form.name,
                email: form.email,
            }
            .into_response()
        }
    }
}

// =============================================================================
// Password Recovery
// =============================================================================

/// Display the password recovery page.
pub async fn forgot_password_page(session: Session) -> impl IntoResponse {
    ForgotPasswordTemplate {
        user_name: None,
        toasts: take_toasts(&session).await,
        email: String::new(),
    }
}

/// Send a password-reset email, then return to the sign-in page.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn forgot_password(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    match AuthService::new(state.gateway())
        .send_recovery_email(&form.email)
        .await
    {
        Ok(()) => {
            push_toast(
                &session,
                Toast::success("Check your inbox for a link to reset your password"),
            )
            .await;
            Redirect::to("/auth").into_response()
        }
        Err(e) => {
            warn!(error = %e, "Password recovery failed");
            ForgotPasswordTemplate {
                user_name: None,
                toasts: vec![Toast::failure(e.to_string())],
                email: form.email,
            }
            .into_response()
        }
    }
}

// =============================================================================
// Sign Out
// =============================================================================

/// Sign out. The cart stays in the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_user(&session).await {
        warn!(error = %e, "Failed to clear session user");
    }
    clear_sentry_user();
    add_breadcrumb("auth", "Signed out", None);
    Redirect::to("/auth")
}

// =============================================================================
// Helpers
// =============================================================================

/// Store a freshly authenticated user under a new session id.
async fn start_session(session: &Session, user: &CurrentUser, action: &str) -> Response {
    if let Err(e) = session.cycle_id().await {
        warn!(error = %e, "Failed to rotate session id");
    }

    if let Err(e) = set_current_user(session, user).await {
        tracing::error!(error = %e, "Failed to store session user");
        return LoginTemplate {
            user_name: None,
            toasts: vec![Toast::failure("Could not start your session, try again")],
            email: user.email.as_str().to_string(),
        }
        .into_response();
    }

    set_sentry_user(&user.uid, Some(user.email.as_str()));
    add_breadcrumb("auth", action, Some(&[("uid", user.uid.as_str())]));
    Redirect::to(HOME_PATH).into_response()
}
