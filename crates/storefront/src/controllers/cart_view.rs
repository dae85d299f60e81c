//! Cart view controller.

use tracing::instrument;

use corner_shop_core::{Cart, CartEntry, ProductId};

use crate::cart_store::{CartStore, CartStoreError};
use crate::storage::KeyValueStore;

/// The cart as shown on the cart page.
#[derive(Debug)]
pub struct CartView<S> {
    store: CartStore<S>,
    cart: Cart,
}

impl<S: KeyValueStore> CartView<S> {
    /// Load the cart for display.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::Malformed`] if the stored cart is unreadable.
    pub async fn open(store: CartStore<S>) -> Result<Self, CartStoreError> {
        let cart = store.load().await?;
        Ok(Self { store, cart })
    }

    /// The loaded cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Entries in ascending product id order.
    #[must_use]
    pub fn entries(&self) -> Vec<&CartEntry> {
        self.cart.entries().collect()
    }

    /// Reload from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be loaded.
    pub async fn reload(&mut self) -> Result<(), CartStoreError> {
        self.cart = self.store.load().await?;
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<(), CartStoreError> {
        self.store.clear().await?;
        self.cart = Cart::new();
        Ok(())
    }

    /// Remove a product's whole entry as currently stored, then reload.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be loaded or saved.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, product_id: &ProductId) -> Result<(), CartStoreError> {
        self.store.remove_entry(product_id).await?;
        self.reload().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use corner_shop_core::{Price, Product, ProductDraft};

    use super::*;
    use crate::cart_store::CART_KEY;
    use crate::storage::MemoryStorage;

    fn product(id: &str) -> Product {
        Product::from_draft(
            ProductId::new(id),
            ProductDraft {
                name: format!("Product {id}"),
                price: Price::from_cents(500),
                sold_units: 0,
                image: String::new(),
            },
        )
    }

    async fn seeded(storage: &MemoryStorage) -> CartStore<MemoryStorage> {
        let store = CartStore::new(storage.clone());
        store.add(&product("b"), 2).await.unwrap();
        store.add(&product("a"), 1).await.unwrap();
        store.add(&product("c"), 4).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_entries_in_id_order() {
        let storage = MemoryStorage::new();
        let view = CartView::open(seeded(&storage).await).await.unwrap();

        let ids: Vec<_> = view.entries().iter().map(|e| e.product.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(view.cart().subtotal(), Price::from_cents(3500));
    }

    #[tokio::test]
    async fn test_remove_drops_whole_entry() {
        let storage = MemoryStorage::new();
        let mut view = CartView::open(seeded(&storage).await).await.unwrap();

        view.remove(&ProductId::new("c")).await.unwrap();

        assert!(view.cart().get(&ProductId::new("c")).is_none());
        assert_eq!(view.cart().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_picks_up_other_changes() {
        let storage = MemoryStorage::new();
        let store = seeded(&storage).await;
        let mut view = CartView::open(store.clone()).await.unwrap();

        store.add(&product("d"), 1).await.unwrap();
        view.remove(&ProductId::new("a")).await.unwrap();

        let ids: Vec<_> = view.entries().iter().map(|e| e.product.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_remove_drops_units_added_after_open() {
        let storage = MemoryStorage::new();
        let store = CartStore::new(storage.clone());
        store.add(&product("a"), 2).await.unwrap();
        let mut view = CartView::open(store.clone()).await.unwrap();

        store.add(&product("a"), 3).await.unwrap();
        view.remove(&ProductId::new("a")).await.unwrap();

        assert!(view.cart().get(&ProductId::new("a")).is_none());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let storage = MemoryStorage::new();
        let mut view = CartView::open(seeded(&storage).await).await.unwrap();

        view.clear().await.unwrap();

        assert!(view.entries().is_empty());
        assert!(storage.raw(CART_KEY).is_none());
    }

    #[tokio::test]
    async fn test_open_malformed_cart_fails() {
        let storage = MemoryStorage::with_value(CART_KEY, "[]");
        let result = CartView::open(CartStore::new(storage)).await;
        assert!(matches!(result, Err(CartStoreError::Malformed(_))));
    }
}
