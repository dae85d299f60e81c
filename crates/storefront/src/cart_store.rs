//! The visitor's cart, persisted as one blob in a [`KeyValueStore`].
//!
//! Every mutation is a whole-blob read-modify-write. Two overlapping requests
//! from the same visitor race and the last write wins.

use thiserror::Error;
use tracing::{debug, instrument};

use corner_shop_core::{Cart, CartError, Product, ProductId};

use crate::storage::{KeyValueStore, StorageError};

/// Key the cart blob is stored under.
pub const CART_KEY: &str = "cart";

/// Errors loading or saving the cart.
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// The underlying store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The stored blob is not a valid cart.
    #[error("stored cart is unreadable: {0}")]
    Malformed(#[from] CartError),
}

/// Cart operations over a key-value store.
#[derive(Debug, Clone)]
pub struct CartStore<S> {
    storage: S,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Wrap a store.
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The current cart; empty when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::Malformed`] if the stored blob cannot be
    /// parsed. The blob is left as it is.
    pub async fn load(&self) -> Result<Cart, CartStoreError> {
        match self.storage.get(CART_KEY).await? {
            Some(blob) => Ok(Cart::from_blob(&blob)?),
            None => Ok(Cart::new()),
        }
    }

    /// Add `quantity` units of `product` and return the updated cart.
    ///
    /// A quantity of zero writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be loaded or saved.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&self, product: &Product, quantity: u32) -> Result<Cart, CartStoreError> {
        let mut cart = self.load().await?;
        if quantity == 0 {
            return Ok(cart);
        }

        cart.add(product, quantity);
        self.save(&cart).await?;
        debug!(items = cart.total_quantity(), "Added to cart");
        Ok(cart)
    }

    /// Take `quantity` units of `product_id` out and return the updated cart.
    ///
    /// Removing a product that is not in the cart writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be loaded or saved.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, CartStoreError> {
        let mut cart = self.load().await?;
        if cart.remove(product_id, quantity) {
            self.save(&cart).await?;
            debug!(items = cart.total_quantity(), "Removed from cart");
        }
        Ok(cart)
    }

    /// Drop `product_id`'s whole entry and return the updated cart.
    ///
    /// The entry is removed from a freshly loaded cart, so units added since
    /// the caller last looked go too. A product not in the cart writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be loaded or saved.
    #[instrument(skip(self))]
    pub async fn remove_entry(&self, product_id: &ProductId) -> Result<Cart, CartStoreError> {
        let mut cart = self.load().await?;
        if cart.remove_entry(product_id) {
            self.save(&cart).await?;
            debug!(items = cart.total_quantity(), "Removed cart entry");
        }
        Ok(cart)
    }

    /// Delete the stored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), CartStoreError> {
        self.storage.remove(CART_KEY).await?;
        Ok(())
    }

    async fn save(&self, cart: &Cart) -> Result<(), CartStoreError> {
        self.storage.set(CART_KEY, cart.to_blob()?).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use corner_shop_core::{Price, ProductDraft};

    use super::*;
    use crate::storage::MemoryStorage;

    fn product(id: &str) -> Product {
        Product::from_draft(
            ProductId::new(id),
            ProductDraft {
                name: format!("Product {id}"),
                price: Price::from_cents(1000),
                sold_units: 0,
                image: String::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_load_without_blob_is_empty() {
        let store = CartStore::new(MemoryStorage::new());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_accumulates() {
        let store = CartStore::new(MemoryStorage::new());
        let p = product("p1");

        store.add(&p, 3).await.unwrap();
        store.add(&p, 2).await.unwrap();

        let cart = store.load().await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&p.id).unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_add_then_remove_same_quantity_deletes_key() {
        let store = CartStore::new(MemoryStorage::new());
        let p = product("p1");

        store.add(&p, 4).await.unwrap();
        store.remove(&p.id, 4).await.unwrap();

        assert!(store.load().await.unwrap().get(&p.id).is_none());
    }

    #[tokio::test]
    async fn test_clear_then_load_is_empty() {
        let storage = MemoryStorage::new();
        let store = CartStore::new(storage.clone());
        store.add(&product("p1"), 1).await.unwrap();
        store.add(&product("p2"), 1).await.unwrap();

        store.clear().await.unwrap();

        assert!(storage.raw(CART_KEY).is_none());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_writes_nothing() {
        let storage = MemoryStorage::new();
        let store = CartStore::new(storage.clone());
        store.add(&product("p1"), 2).await.unwrap();
        let writes = storage.writes();
        let blob = storage.raw(CART_KEY);

        let cart = store.remove(&ProductId::new("ghost"), 1).await.unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(storage.writes(), writes);
        assert_eq!(storage.raw(CART_KEY), blob);
    }

    #[tokio::test]
    async fn test_remove_zero_writes_nothing() {
        let storage = MemoryStorage::new();
        let store = CartStore::new(storage.clone());
        store.add(&product("p1"), 2).await.unwrap();
        let writes = storage.writes();

        let cart = store.remove(&ProductId::new("p1"), 0).await.unwrap();

        assert_eq!(cart.get(&ProductId::new("p1")).unwrap().quantity, 2);
        assert_eq!(storage.writes(), writes);
    }

    #[tokio::test]
    async fn test_remove_entry_drops_current_quantity() {
        let storage = MemoryStorage::new();
        let store = CartStore::new(storage.clone());
        store.add(&product("p1"), 2).await.unwrap();
        store.add(&product("p1"), 3).await.unwrap();

        let cart = store.remove_entry(&ProductId::new("p1")).await.unwrap();

        assert!(cart.is_empty());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_entry_absent_writes_nothing() {
        let storage = MemoryStorage::new();
        let store = CartStore::new(storage.clone());
        store.add(&product("p1"), 1).await.unwrap();
        let writes = storage.writes();

        store.remove_entry(&ProductId::new("ghost")).await.unwrap();

        assert_eq!(storage.writes(), writes);
    }

    #[tokio::test]
    async fn test_add_zero_writes_nothing() {
        let storage = MemoryStorage::new();
        let store = CartStore::new(storage.clone());

        store.add(&product("p1"), 0).await.unwrap();

        assert_eq!(storage.writes(), 0);
        assert!(storage.raw(CART_KEY).is_none());
    }

    #[tokio::test]
    async fn test_existing_blob_remove_all() {
        let storage = MemoryStorage::with_value(
            CART_KEY,
            r#"{"p1":{"product":{"id":"p1","name":"X"},"quantity":2}}"#,
        );
        let store = CartStore::new(storage);

        store.remove(&ProductId::new("p1"), 2).await.unwrap();

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_blob_is_reported_and_kept() {
        let storage = MemoryStorage::with_value(CART_KEY, "{not json");
        let store = CartStore::new(storage.clone());

        assert!(matches!(
            store.load().await,
            Err(CartStoreError::Malformed(_))
        ));
        assert!(matches!(
            store.add(&product("p1"), 1).await,
            Err(CartStoreError::Malformed(_))
        ));
        assert_eq!(storage.raw(CART_KEY).as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn test_blob_is_keyed_by_product_id() {
        let storage = MemoryStorage::new();
        let store = CartStore::new(storage.clone());
        store.add(&product("p1"), 1).await.unwrap();

        let blob: serde_json::Value =
            serde_json::from_str(&storage.raw(CART_KEY).unwrap()).unwrap();
        assert_eq!(blob["p1"]["quantity"], 1);
        assert_eq!(blob["p1"]["product"]["id"], "p1");
        assert_eq!(blob["p1"]["product"]["soldUnits"], 0);
    }
}
