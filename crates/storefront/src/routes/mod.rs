//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Redirect to /products
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Readiness check (database)
//!
//! # Auth
//! GET  /auth                     - Sign-in page
//! POST /auth                     - Sign-in action
//! GET  /auth/sign-up             - Sign-up page
//! POST /auth/sign-up             - Sign-up action
//! GET  /auth/forgot-password     - Recovery page
//! POST /auth/forgot-password     - Send recovery email
//! POST /auth/logout              - Sign out (cart is kept)
//!
//! # Profile (requires auth)
//! GET  /profile                  - Profile page
//! POST /profile                  - Change display name
//!
//! # Products (requires auth)
//! GET  /products                 - Product list (fetched on every visit,
//!                                  ?refresh=1 from the refresh link)
//! GET  /products/new             - Add-product form
//! POST /products                 - Create product
//! GET  /products/{id}/edit       - Update-product form
//! POST /products/{id}            - Update product
//! GET  /products/{id}/delete     - Delete confirmation
//! POST /products/{id}/delete     - Delete product, image first
//! GET  /products/{id}/cart       - Add-to-cart confirmation
//! POST /products/{id}/cart       - Add one unit to the cart
//! POST /products/{id}/cart/remove - Take units out of the cart
//!
//! # Cart
//! GET  /cart                     - Cart page
//! GET  /cart/clear               - Clear confirmation
//! POST /cart/clear               - Clear cart
//! POST /cart/remove              - Remove a whole entry
//! ```

pub mod auth;
pub mod cart;
pub mod products;
pub mod profile;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware::from_fn,
    response::Redirect,
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::filters;
use crate::middleware::request_id_middleware;
use crate::presentation::{Alert, Toast};
use crate::state::AppState;

/// Largest accepted product form body; the image travels inline as a data URL.
const PRODUCT_FORM_LIMIT: usize = 10 * 1024 * 1024;

/// Confirmation dialog page shared by destructive actions.
#[derive(Template, WebTemplate)]
#[template(path = "confirm.html")]
pub struct ConfirmTemplate {
    pub user_name: Option<String>,
    pub toasts: Vec<Toast>,
    pub alert: Alert,
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::login_page).post(auth::login))
        .route("/sign-up", get(auth::sign_up_page).post(auth::sign_up))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new_page))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit_page))
        .route(
            "/{id}/delete",
            get(products::delete_page).post(products::delete),
        )
        .route(
            "/{id}/cart",
            get(products::add_to_cart_page).post(products::add_to_cart),
        )
        .route("/{id}/cart/remove", post(products::remove_from_cart))
        .layer(DefaultBodyLimit::max(PRODUCT_FORM_LIMIT))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/clear", get(cart::clear_page).post(cart::clear))
        .route("/remove", post(cart::remove))
}

/// Create all page routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        .nest("/auth", auth_routes())
        .route("/profile", get(profile::show).post(profile::update))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
}

/// Build the full application: health checks, pages, sessions and request
/// tracing.
///
/// Sentry layers are added by the binary on top of this.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity (the session store) before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
