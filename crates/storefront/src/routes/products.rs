//! Product route handlers.
//!
//! Products belong to the signed-in user and live in the remote document
//! store under `users/{uid}/products`. Every list view re-fetches them.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use corner_shop_core::{Cart, Price, Product, ProductDraft, ProductId};

use crate::controllers::{ProductForm, ProductList, product_list};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::gateway::GatewayError;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::presentation::{Alert, Toast, push_toast, take_toasts};
use crate::routes::ConfirmTemplate;
use crate::routes::cart::session_cart;
use crate::state::AppState;

const LIST_PATH: &str = "/products";

// =============================================================================
// View Types
// =============================================================================

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub sold_units: u32,
    pub image: String,
    /// Units of this product currently in the cart.
    pub in_cart: u32,
}

impl ProductView {
    fn new(product: &Product, cart: &Cart) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            sold_units: product.sold_units,
            image: product.image.clone(),
            in_cart: cart.get(&product.id).map_or(0, |entry| entry.quantity),
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add/update product form data.
///
/// `image` carries the selected file as a data URL; it is empty when no new
/// file was picked.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFormData {
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub sold_units: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl ProductFormData {
    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.amount().to_string(),
            sold_units: product.sold_units.to_string(),
            image: None,
        }
    }

    /// Parse the numeric fields. Business rules are checked by the
    /// controller.
    fn to_draft(&self) -> Result<ProductDraft, String> {
        let price = Price::from_str(&self.price).map_err(|_| "Price must be a number".to_string())?;
        let sold_units = match self.sold_units.trim() {
            "" => 0,
            raw => raw
                .parse::<u32>()
                .map_err(|_| "Units sold must be a whole number".to_string())?,
        };

        Ok(ProductDraft {
            name: self.name.clone(),
            price,
            sold_units,
            image: String::new(),
        })
    }
}

/// Remove-from-cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub quantity: Option<u32>,
}

// =============================================================================
// Templates
// =============================================================================

/// Product list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub user_name: Option<String>,
    pub toasts: Vec<Toast>,
    pub products: Vec<ProductView>,
    pub cart_count: u64,
}

/// Add/update product form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub user_name: Option<String>,
    pub toasts: Vec<Toast>,
    pub heading: String,
    pub action: String,
    pub submit_label: String,
    pub name: String,
    pub price: String,
    pub sold_units: String,
    /// Current image, shown on the update form.
    pub image_url: Option<String>,
}

impl ProductFormTemplate {
    fn create(user: &CurrentUser, form: &ProductFormData, toasts: Vec<Toast>) -> Self {
        Self {
            user_name: Some(user.name.clone()),
            toasts,
            heading: "Add product".to_string(),
            action: LIST_PATH.to_string(),
            submit_label: "Create".to_string(),
            name: form.name.clone(),
            price: form.price.clone(),
            sold_units: form.sold_units.clone(),
            image_url: None,
        }
    }

    fn update(
        user: &CurrentUser,
        product: &Product,
        form: &ProductFormData,
        toasts: Vec<Toast>,
    ) -> Self {
        Self {
            user_name: Some(user.name.clone()),
            toasts,
            heading: "Update product".to_string(),
            action: product_path(&product.id, ""),
            submit_label: "Save".to_string(),
            name: form.name.clone(),
            price: form.price.clone(),
            sold_units: form.sold_units.clone(),
            image_url: Some(product.image.clone()),
        }
    }
}

// =============================================================================
// List
// =============================================================================

/// Display the signed-in user's products.
///
/// A failed fetch shows an empty list with a failure toast.
#[instrument(skip(state, session, user), fields(uid = %user.uid))]
pub async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    let mut toasts = take_toasts(&session).await;

    let mut list = ProductList::new();
    if let Err(e) = list.refresh(state.gateway(), &user).await {
        warn!(error = %e, "Failed to fetch products");
        toasts.push(Toast::failure(e.to_string()));
    }

    let cart = match session_cart(&session).load().await {
        Ok(cart) => cart,
        Err(e) => {
            warn!(error = %e, "Failed to load cart for product list");
            Cart::new()
        }
    };

    ProductsIndexTemplate {
        user_name: Some(user.name),
        toasts,
        products: list
            .products()
            .iter()
            .map(|product| ProductView::new(product, &cart))
            .collect(),
        cart_count: cart.total_quantity(),
    }
}

// =============================================================================
// Create
// =============================================================================

/// Display the add-product form.
pub async fn new_page(RequireAuth(user): RequireAuth, session: Session) -> impl IntoResponse {
    let form = ProductFormData {
        sold_units: "0".to_string(),
        ..ProductFormData::default()
    };
    ProductFormTemplate::create(&user, &form, take_toasts(&session).await)
}

/// Handle add-product form submission.
#[instrument(skip(state, session, user, form), fields(uid = %user.uid))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductFormData>,
) -> Response {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(message) => {
            return ProductFormTemplate::create(&user, &form, vec![Toast::failure(message)])
                .into_response();
        }
    };

    match ProductForm::new(state.gateway(), &user)
        .create(draft, form.image.as_deref(), Utc::now())
        .await
    {
        Ok(product) => {
            add_breadcrumb("products", "Created product", Some(&[("product_id", product.id.as_str())]));
            push_toast(&session, Toast::success("Product created")).await;
            Redirect::to(LIST_PATH).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Failed to create product");
            ProductFormTemplate::create(&user, &form, vec![Toast::failure(e.to_string())])
                .into_response()
        }
    }
}

// =============================================================================
// Update
// =============================================================================

/// Display the update-product form.
#[instrument(skip(state, session, user), fields(uid = %user.uid))]
pub async fn edit_page(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let product = product_list::fetch_product(state.gateway(), &user, &ProductId::new(id)).await?;
    let form = ProductFormData::from_product(&product);

    Ok(
        ProductFormTemplate::update(&user, &product, &form, take_toasts(&session).await)
            .into_response(),
    )
}

/// Handle update-product form submission.
#[instrument(skip(state, session, user, form), fields(uid = %user.uid))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ProductFormData>,
) -> Result<Response, AppError> {
    let existing =
        product_list::fetch_product(state.gateway(), &user, &ProductId::new(id)).await?;

    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(message) => {
            return Ok(ProductFormTemplate::update(
                &user,
                &existing,
                &form,
                vec![Toast::failure(message)],
            )
            .into_response());
        }
    };

    match ProductForm::new(state.gateway(), &user)
        .update(&existing, draft, form.image.as_deref())
        .await
    {
        Ok(_) => {
            push_toast(&session, Toast::success("Product updated")).await;
            Ok(Redirect::to(LIST_PATH).into_response())
        }
        Err(e) => {
            warn!(error = %e, "Failed to update product");
            Ok(ProductFormTemplate::update(
                &user,
                &existing,
                &form,
                vec![Toast::failure(e.to_string())],
            )
            .into_response())
        }
    }
}

// =============================================================================
// Delete
// =============================================================================

/// Ask before deleting a product.
#[instrument(skip(state, session, user), fields(uid = %user.uid))]
pub async fn delete_page(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let product = product_list::fetch_product(state.gateway(), &user, &ProductId::new(id)).await?;

    Ok(ConfirmTemplate {
        user_name: Some(user.name),
        toasts: take_toasts(&session).await,
        alert: Alert::confirm(
            "Delete product",
            format!("Are you sure you want to delete {}?", product.name),
            "Delete",
            product_path(&product.id, "/delete"),
            LIST_PATH,
        ),
    }
    .into_response())
}

/// Delete a product from the freshly fetched list, image first.
#[instrument(skip(state, session, user), fields(uid = %user.uid))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Redirect {
    let id = ProductId::new(id);
    let mut list = ProductList::new();

    let result = match list.refresh(state.gateway(), &user).await {
        Ok(()) => match list.find(&id).cloned() {
            Some(product) => list.delete(state.gateway(), &user, &product).await,
            None => Err(GatewayError::NotFound(id.to_string())),
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            add_breadcrumb("products", "Deleted product", Some(&[("product_id", id.as_str())]));
            push_toast(&session, Toast::success("Product deleted successfully")).await;
        }
        Err(e) => {
            warn!(error = %e, product_id = %id, "Failed to delete product");
            push_toast(&session, Toast::failure(e.to_string())).await;
        }
    }

    Redirect::to(LIST_PATH)
}

// =============================================================================
// Cart
// =============================================================================

/// Ask before adding a product to the cart.
#[instrument(skip(state, session, user), fields(uid = %user.uid))]
pub async fn add_to_cart_page(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let product = product_list::fetch_product(state.gateway(), &user, &ProductId::new(id)).await?;

    Ok(ConfirmTemplate {
        user_name: Some(user.name),
        toasts: take_toasts(&session).await,
        alert: Alert::confirm(
            "Add to cart",
            format!("Add {} to your cart?", product.name),
            "Add",
            product_path(&product.id, "/cart"),
            LIST_PATH,
        ),
    }
    .into_response())
}

/// Put one unit of a product in the cart.
///
/// The cart keeps a snapshot of the product as fetched now.
#[instrument(skip(state, session, user), fields(uid = %user.uid))]
pub async fn add_to_cart(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Redirect {
    let id = ProductId::new(id);

    let toast = match product_list::fetch_product(state.gateway(), &user, &id).await {
        Ok(product) => match product_list::add_to_cart(&session_cart(&session), &product).await {
            Ok(_) => {
                add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));
                Toast::success("Added to cart")
            }
            Err(e) => {
                warn!(error = %e, "Failed to add to cart");
                Toast::failure(e.to_string())
            }
        },
        Err(e) => {
            warn!(error = %e, "Failed to fetch product for cart");
            Toast::failure(e.to_string())
        }
    };

    push_toast(&session, toast).await;
    Redirect::to(LIST_PATH)
}

/// Take units of a product out of the cart (one unless the form says
/// otherwise).
#[instrument(skip_all, fields(product_id = %id))]
pub async fn remove_from_cart(
    RequireAuth(_user): RequireAuth,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<RemoveFromCartForm>,
) -> Redirect {
    let id = ProductId::new(id);
    let quantity = form.quantity.unwrap_or(1);

    match product_list::remove_from_cart(&session_cart(&session), &id, quantity).await {
        Ok(_) => push_toast(&session, Toast::success("Removed from cart")).await,
        Err(e) => {
            warn!(error = %e, "Failed to remove from cart");
            push_toast(&session, Toast::failure(e.to_string())).await;
        }
    }

    Redirect::to(LIST_PATH)
}

// =============================================================================
// Helpers
// =============================================================================

fn product_path(id: &ProductId, suffix: &str) -> String {
    format!("{LIST_PATH}/{}{suffix}", urlencoding::encode(id.as_str()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_to_draft() {
        let form = ProductFormData {
            name: "Termo".to_string(),
            price: "12.50".to_string(),
            sold_units: " 3 ".to_string(),
            image: None,
        };
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.price, Price::from_cents(1250));
        assert_eq!(draft.sold_units, 3);
    }

    #[test]
    fn test_form_to_draft_rejects_bad_numbers() {
        let mut form = ProductFormData {
            name: "Termo".to_string(),
            price: "cheap".to_string(),
            ..ProductFormData::default()
        };
        assert_eq!(form.to_draft().unwrap_err(), "Price must be a number");

        form.price = "1".to_string();
        form.sold_units = "-2".to_string();
        assert_eq!(form.to_draft().unwrap_err(), "Units sold must be a whole number");

        form.sold_units = String::new();
        assert_eq!(form.to_draft().unwrap().sold_units, 0);
    }

    #[test]
    fn test_product_path_encodes_id() {
        assert_eq!(product_path(&ProductId::new("a b"), "/cart"), "/products/a%20b/cart");
        assert_eq!(product_path(&ProductId::new("x1"), ""), "/products/x1");
    }
}
