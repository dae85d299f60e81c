//! Document and file paths used by the storefront.
//!
//! ```text
//! users/{uid}                      account record {uid, email, name}
//! users/{uid}/products             the user's products
//! users/{uid}/products/{id}        one product
//! {uid}/{unix_millis}              product image file
//! ```

use corner_shop_core::{ProductId, UserId};

/// Account record of `uid`.
#[must_use]
pub fn user(uid: &UserId) -> String {
    format!("users/{uid}")
}

/// Product collection of `uid`.
#[must_use]
pub fn user_products(uid: &UserId) -> String {
    format!("users/{uid}/products")
}

/// One product of `uid`.
#[must_use]
pub fn user_product(uid: &UserId, id: &ProductId) -> String {
    format!("users/{uid}/products/{id}")
}

/// Storage path for a new product image uploaded at `unix_millis`.
#[must_use]
pub fn product_image(uid: &UserId, unix_millis: i64) -> String {
    format!("{uid}/{unix_millis}")
}
