//! Products owned by a signed-in user.
//!
//! The remote document store is the source of truth; a [`Product`] is only a
//! read-through copy (or, inside a cart, a snapshot taken when it was added).

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Minimum length of a product name.
pub const MIN_NAME_LENGTH: usize = 4;

/// Validation errors for a [`ProductDraft`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// The name is empty after trimming.
    #[error("product name is required")]
    EmptyName,
    /// The name is shorter than [`MIN_NAME_LENGTH`].
    #[error("product name must be at least {min} characters")]
    NameTooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The price is below zero.
    #[error("price cannot be negative")]
    NegativePrice,
    /// A new product needs an image.
    #[error("an image is required")]
    MissingImage,
}

/// A product as stored under `users/{uid}/products/{id}`.
///
/// Every field except `id` falls back to its default when missing, so older
/// cart snapshots that only carried `id` and `name` still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Document id assigned by the gateway.
    pub id: ProductId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Unit price.
    #[serde(default)]
    pub price: Price,
    /// Units sold so far.
    #[serde(default)]
    pub sold_units: u32,
    /// Download URL of the product image.
    #[serde(default)]
    pub image: String,
}

impl Product {
    /// Build a product from a gateway-assigned id and its stored fields.
    #[must_use]
    pub fn from_draft(id: ProductId, draft: ProductDraft) -> Self {
        Self {
            id,
            name: draft.name,
            price: draft.price,
            sold_units: draft.sold_units,
            image: draft.image,
        }
    }

    /// The writable fields of this product.
    #[must_use]
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            price: self.price,
            sold_units: self.sold_units,
            image: self.image.clone(),
        }
    }
}

/// The document body of a product: everything except the id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Units sold so far.
    #[serde(default)]
    pub sold_units: u32,
    /// Download URL of the product image (empty until uploaded).
    #[serde(default)]
    pub image: String,
}

impl ProductDraft {
    /// Trim the name and check the fields a form can get wrong.
    ///
    /// The image is not checked here: it is only known after upload.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductError`] found.
    pub fn validate(mut self) -> Result<Self, ProductError> {
        self.name = self.name.trim().to_owned();

        if self.name.is_empty() {
            return Err(ProductError::EmptyName);
        }
        if self.name.chars().count() < MIN_NAME_LENGTH {
            return Err(ProductError::NameTooShort {
                min: MIN_NAME_LENGTH,
            });
        }
        if self.price.is_negative() {
            return Err(ProductError::NegativePrice);
        }

        Ok(self)
    }
}
