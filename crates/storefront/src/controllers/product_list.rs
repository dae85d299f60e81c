//! Product list controller.

use tracing::{debug, info, instrument};

use corner_shop_core::{Cart, Product, ProductId};

use crate::cart_store::{CartStore, CartStoreError};
use crate::gateway::{Document, Gateway, GatewayError, paths};
use crate::models::CurrentUser;
use crate::storage::KeyValueStore;

/// The signed-in user's products, as last fetched.
#[derive(Debug, Clone, Default)]
pub struct ProductList {
    products: Vec<Product>,
}

impl ProductList {
    /// An empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// A list holding `products`, as if just fetched.
    #[must_use]
    pub const fn from_products(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Products in fetch order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == *id)
    }

    /// Replace the list with the user's products from the gateway.
    ///
    /// On failure the previous list is kept.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if listing or decoding fails.
    #[instrument(skip_all, fields(uid = %user.uid))]
    pub async fn refresh(
        &mut self,
        gateway: &Gateway,
        user: &CurrentUser,
    ) -> Result<(), GatewayError> {
        let documents = gateway
            .documents
            .list(&user.id_token, &paths::user_products(&user.uid))
            .await?;

        self.products = documents
            .iter()
            .map(Document::decode::<Product>)
            .collect::<Result<_, _>>()?;

        debug!(count = self.products.len(), "Fetched products");
        Ok(())
    }

    /// Delete a product: its image file, then its document, then the list
    /// entry.
    ///
    /// Steps run in order and stop at the first failure, leaving the list
    /// untouched. A failure after the file is gone leaves the document
    /// without an image.
    ///
    /// # Errors
    ///
    /// Returns the first gateway error.
    #[instrument(skip_all, fields(uid = %user.uid, product_id = %product.id))]
    pub async fn delete(
        &mut self,
        gateway: &Gateway,
        user: &CurrentUser,
        product: &Product,
    ) -> Result<(), GatewayError> {
        let image_path = gateway.files.path_from_url(&product.image)?;
        gateway.files.delete(&user.id_token, &image_path).await?;
        gateway
            .documents
            .delete(&user.id_token, &paths::user_product(&user.uid, &product.id))
            .await?;

        self.products.retain(|p| p.id != product.id);
        info!("Product deleted");
        Ok(())
    }
}

/// Fetch one of the user's products.
///
/// # Errors
///
/// Returns `GatewayError::NotFound` if the product does not exist.
#[instrument(skip(gateway, user), fields(uid = %user.uid))]
pub async fn fetch_product(
    gateway: &Gateway,
    user: &CurrentUser,
    id: &ProductId,
) -> Result<Product, GatewayError> {
    let path = paths::user_product(&user.uid, id);
    gateway
        .documents
        .get(&user.id_token, &path)
        .await?
        .ok_or(GatewayError::NotFound(path))?
        .decode()
}

/// Put one unit of `product` in the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or saved.
pub async fn add_to_cart<S: KeyValueStore>(
    store: &CartStore<S>,
    product: &Product,
) -> Result<Cart, CartStoreError> {
    store.add(product, 1).await
}

/// Take `quantity` units of `product_id` out of the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or saved.
pub async fn remove_from_cart<S: KeyValueStore>(
    store: &CartStore<S>,
    product_id: &ProductId,
    quantity: u32,
) -> Result<Cart, CartStoreError> {
    store.remove(product_id, quantity).await
}
