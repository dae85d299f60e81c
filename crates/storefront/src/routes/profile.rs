//! Profile route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::filters;
use crate::middleware::{RequireAuth, set_current_user};
use crate::presentation::{Toast, push_toast, take_toasts};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub user_name: Option<String>,
    pub toasts: Vec<Toast>,
    pub name: String,
    pub email: String,
}

/// Display the signed-in user's profile.
pub async fn show(RequireAuth(user): RequireAuth, session: Session) -> impl IntoResponse {
    ProfileTemplate {
        user_name: Some(user.name.clone()),
        toasts: take_toasts(&session).await,
        name: user.name,
        email: user.email.into_inner(),
    }
}

/// Change the display name.
#[instrument(skip(state, session, user, form), fields(uid = %user.uid))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Response {
    match AuthService::new(state.gateway())
        .update_display_name(&user, &form.name)
        .await
    {
        Ok(updated) => {
            if let Err(e) = set_current_user(&session, &updated).await {
                warn!(error = %e, "Failed to store updated user");
            }
            push_toast(&session, Toast::success("Profile updated")).await;
            Redirect::to("/profile").into_response()
        }
        Err(e) => {
            warn!(error = %e, "Failed to update profile");
            ProfileTemplate {
                user_name: Some(user.name),
                toasts: vec![Toast::failure(e.to_string())],
                name: form.name,
                email: user.email.into_inner(),
            }
            .into_response()
        }
    }
}
