//! Cart route handlers.
//!
//! The cart lives in the session as a serialized blob and needs no sign-in.
//! Entries are snapshots taken when products were added, so the page renders
//! without touching the gateway.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use corner_shop_core::{CartEntry, ProductId};

use crate::cart_store::{CartStore, CartStoreError};
use crate::controllers::CartView;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::presentation::{Alert, Toast, push_toast, take_toasts};
use crate::routes::ConfirmTemplate;
use crate::storage::SessionStorage;

const CART_PATH: &str = "/cart";

/// The cart stored in this request's session.
pub(crate) fn session_cart(session: &Session) -> CartStore<SessionStorage> {
    CartStore::new(SessionStorage::new(session.clone()))
}

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl From<&CartEntry> for CartItemView {
    fn from(entry: &CartEntry) -> Self {
        Self {
            product_id: entry.product.id.to_string(),
            name: entry.product.name.clone(),
            image: entry.product.image.clone(),
            quantity: entry.quantity,
            price: entry.product.price.to_string(),
            line_price: entry.line_total().to_string(),
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Remove-entry form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub product_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub user_name: Option<String>,
    pub toasts: Vec<Toast>,
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub subtotal: String,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the cart.
///
/// An unreadable cart ends in an error page offering to clear it.
#[instrument(skip_all)]
pub async fn show(
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let view = CartView::open(session_cart(&session)).await?;

    Ok(CartShowTemplate {
        user_name: user.map(|u| u.name),
        toasts: take_toasts(&session).await,
        items: view.entries().into_iter().map(CartItemView::from).collect(),
        item_count: view.cart().total_quantity(),
        subtotal: view.cart().subtotal().to_string(),
    })
}

/// Ask before clearing the cart.
pub async fn clear_page(OptionalAuth(user): OptionalAuth, session: Session) -> impl IntoResponse {
    ConfirmTemplate {
        user_name: user.map(|u| u.name),
        toasts: take_toasts(&session).await,
        alert: Alert::confirm(
            "Clear cart",
            "Remove every product from your cart?",
            "Clear",
            "/cart/clear",
            CART_PATH,
        ),
    }
}

/// Clear the cart.
///
/// Works on an unreadable cart too, which is how the user recovers from one.
#[instrument(skip_all)]
pub async fn clear(session: Session) -> Result<Redirect, AppError> {
    let store = session_cart(&session);

    match CartView::open(store.clone()).await {
        Ok(mut view) => view.clear().await?,
        Err(CartStoreError::Malformed(e)) => {
            warn!(error = %e, "Discarding unreadable cart");
            store.clear().await?;
        }
        Err(e) => return Err(e.into()),
    }

    add_breadcrumb("cart", "Cleared cart", None);
    push_toast(&session, Toast::success("Cart cleared")).await;
    Ok(Redirect::to(CART_PATH))
}

/// Remove a product's whole entry from the cart.
#[instrument(skip_all, fields(product_id = %form.product_id))]
pub async fn remove(session: Session, Form(form): Form<RemoveForm>) -> Redirect {
    let product_id = ProductId::new(form.product_id);

    let result = match CartView::open(session_cart(&session)).await {
        Ok(mut view) => view.remove(&product_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => push_toast(&session, Toast::success("Removed from cart")).await,
        Err(e) => {
            warn!(error = %e, "Failed to remove cart entry");
            push_toast(&session, Toast::failure(e.to_string())).await;
        }
    }

    Redirect::to(CART_PATH)
}
