//! The local shopping cart.
//!
//! A [`Cart`] maps a product id to a [`CartEntry`]: a snapshot of the product
//! taken when it was first added, plus the desired quantity. Two invariants
//! hold for every cart this module hands out:
//!
//! - every key equals `entry.product.id`
//! - every quantity is at least 1 (an entry that would drop to zero is removed)
//!
//! The serialized form ("blob") is a JSON object keyed by product id:
//!
//! ```json
//! {"p1":{"product":{"id":"p1","name":"X"},"quantity":2}}
//! ```
//!
//! Blobs that violate the invariants are rejected when parsed rather than
//! silently repaired.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::{Price, ProductId};

/// Errors reading or writing a cart blob.
#[derive(thiserror::Error, Debug)]
pub enum CartError {
    /// The blob is not a JSON object of cart entries.
    #[error("malformed cart data: {0}")]
    Malformed(#[from] serde_json::Error),
    /// An entry is stored under a key that is not its product id.
    #[error("cart entry stored under {key} holds product {product_id}")]
    KeyMismatch {
        /// Key the entry was stored under.
        key: ProductId,
        /// Id of the product snapshot in the entry.
        product_id: ProductId,
    },
    /// An entry has a quantity of zero.
    #[error("cart entry {0} has zero quantity")]
    ZeroQuantity(ProductId),
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Product snapshot taken when the entry was created.
    pub product: Product,
    /// Desired quantity, always at least 1.
    pub quantity: u32,
}

impl CartEntry {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Mapping from product id to cart entry.
///
/// Iteration is in ascending product id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<ProductId, CartEntry>",
    into = "BTreeMap<ProductId, CartEntry>"
)]
pub struct Cart {
    entries: BTreeMap<ProductId, CartEntry>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a persisted blob.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the text is not a cart object or an entry
    /// breaks one of the invariants.
    pub fn from_blob(blob: &str) -> Result<Self, CartError> {
        // serde's try_from wraps invariant errors as strings; validate here
        // instead so callers get the typed variant.
        let entries: BTreeMap<ProductId, CartEntry> = serde_json::from_str(blob)?;
        Self::try_from(entries)
    }

    /// Serialize the whole mapping for persistence.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Malformed`] if serialization fails.
    pub fn to_blob(&self) -> Result<String, CartError> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing entry keeps its original snapshot and has its quantity
    /// increased (saturating). A quantity of zero changes nothing.
    pub fn add(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }

        self.entries
            .entry(product.id.clone())
            .and_modify(|entry| entry.quantity = entry.quantity.saturating_add(quantity))
            .or_insert_with(|| CartEntry {
                product: product.clone(),
                quantity,
            });
    }

    /// Take `quantity` units of `product_id` out of the cart.
    ///
    /// The entry is deleted once its quantity would reach zero. Returns
    /// `false` (and changes nothing) when the product is not in the cart or
    /// `quantity` is zero.
    pub fn remove(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        let Some(entry) = self.entries.get_mut(product_id) else {
            return false;
        };

        if entry.quantity <= quantity {
            self.entries.remove(product_id);
        } else {
            entry.quantity -= quantity;
        }
        true
    }

    /// Delete the entry for `product_id` whatever its quantity.
    ///
    /// Returns `false` when the product is not in the cart.
    pub fn remove_entry(&mut self, product_id: &ProductId) -> bool {
        self.entries.remove(product_id).is_some()
    }

    /// Look up an entry.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartEntry> {
        self.entries.get(product_id)
    }

    /// Entries in ascending product id order.
    pub fn entries(&self) -> impl Iterator<Item = &CartEntry> {
        self.entries.values()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.entries.values().map(|e| u64::from(e.quantity)).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.entries.values().map(CartEntry::line_total).sum()
    }
}

impl TryFrom<BTreeMap<ProductId, CartEntry>> for Cart {
    type Error = CartError;

    fn try_from(entries: BTreeMap<ProductId, CartEntry>) -> Result<Self, Self::Error> {
        for (key, entry) in &entries {
            if *key != entry.product.id {
                return Err(CartError::KeyMismatch {
                    key: key.clone(),
                    product_id: entry.product.id.clone(),
                });
            }
            if entry.quantity == 0 {
                return Err(CartError::ZeroQuantity(key.clone()));
            }
        }
        Ok(Self { entries })
    }
}

impl From<Cart> for BTreeMap<ProductId, CartEntry> {
    fn from(cart: Cart) -> Self {
        cart.entries
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartEntry;
    type IntoIter = std::collections::btree_map::Values<'a, ProductId, CartEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
