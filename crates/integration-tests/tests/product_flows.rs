//! Product create/update/delete flows against the in-memory gateway.

#![allow(clippy::unwrap_used)]

use chrono::Utc;

use corner_shop_core::{Price, ProductDraft, ProductId};
use corner_shop_integration_tests::{seed_product, signed_in};
use corner_shop_storefront::cart_store::CartStore;
use corner_shop_storefront::controllers::{ProductForm, ProductList, product_list};
use corner_shop_storefront::gateway::Gateway;
use corner_shop_storefront::gateway::memory::{MemoryGateway, Operation};
use corner_shop_storefront::gateway::paths;
use corner_shop_storefront::storage::MemoryStorage;

const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

fn draft(name: &str, cents: i64) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        price: Price::from_cents(cents),
        sold_units: 0,
        image: String::new(),
    }
}

#[tokio::test]
async fn test_created_product_appears_in_list() {
    let memory = MemoryGateway::new();
    let gateway = Gateway::memory(&memory);
    let user = signed_in("u1");

    let created = ProductForm::new(&gateway, &user)
        .create(draft("Thermos", 1999), Some(PNG), Utc::now())
        .await
        .unwrap();

    let mut list = ProductList::new();
    list.refresh(&gateway, &user).await.unwrap();

    let listed = list.find(&created.id).unwrap();
    assert_eq!(listed, &created);
    assert_eq!(listed.price, Price::from_cents(1999));
}

#[tokio::test]
async fn test_products_are_scoped_to_their_owner() {
    let memory = MemoryGateway::new();
    let gateway = Gateway::memory(&memory);
    let ana = signed_in("u1");
    let bo = signed_in("u2");
    seed_product(&memory, &ana.uid, "p1", "Ana's mug");

    let mut list = ProductList::new();
    list.refresh(&gateway, &bo).await.unwrap();

    assert!(list.products().is_empty());
}

#[tokio::test]
async fn test_delete_removes_image_then_document() {
    let memory = MemoryGateway::new();
    let gateway = Gateway::memory(&memory);
    let user = signed_in("u1");
    seed_product(&memory, &user.uid, "p1", "Thermos");

    let mut list = ProductList::new();
    list.refresh(&gateway, &user).await.unwrap();
    let product = list.find(&ProductId::new("p1")).cloned().unwrap();
    memory.clear_calls();

    list.delete(&gateway, &user, &product).await.unwrap();

    assert!(list.products().is_empty());
    assert!(memory.file("u1/p1").is_none());
    assert!(memory.document(&paths::user_product(&user.uid, &product.id)).is_none());
    assert_eq!(
        memory.operations(),
        [Operation::DeleteFile, Operation::DeleteDocument]
    );
}

#[tokio::test]
async fn test_failed_document_delete_keeps_product_listed() {
    let memory = MemoryGateway::new();
    let gateway = Gateway::memory(&memory);
    let user = signed_in("u1");
    seed_product(&memory, &user.uid, "p1", "Thermos");

    let mut list = ProductList::new();
    list.refresh(&gateway, &user).await.unwrap();
    let product = list.find(&ProductId::new("p1")).cloned().unwrap();
    memory.fail(Operation::DeleteDocument, "Missing or insufficient permissions.");

    let err = list.delete(&gateway, &user, &product).await.unwrap_err();

    assert_eq!(err.to_string(), "Missing or insufficient permissions.");
    assert!(list.find(&product.id).is_some());
    // The image is already gone; the document stays behind without it.
    assert!(memory.file("u1/p1").is_none());
    assert!(memory.document(&paths::user_product(&user.uid, &product.id)).is_some());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_list() {
    let memory = MemoryGateway::new();
    let gateway = Gateway::memory(&memory);
    let user = signed_in("u1");
    seed_product(&memory, &user.uid, "p1", "Thermos");

    let mut list = ProductList::new();
    list.refresh(&gateway, &user).await.unwrap();
    memory.fail(Operation::ListDocuments, "unavailable");

    assert!(list.refresh(&gateway, &user).await.is_err());
    assert_eq!(list.products().len(), 1);
}

#[tokio::test]
async fn test_update_keeps_image_and_cart_keeps_snapshot() {
    let memory = MemoryGateway::new();
    let gateway = Gateway::memory(&memory);
    let user = signed_in("u1");
    let image = seed_product(&memory, &user.uid, "p1", "Thermos");
    let cart = CartStore::new(MemoryStorage::new());

    let original = product_list::fetch_product(&gateway, &user, &ProductId::new("p1"))
        .await
        .unwrap();
    product_list::add_to_cart(&cart, &original).await.unwrap();

    let updated = ProductForm::new(&gateway, &user)
        .update(&original, draft("Thermos XL", 2500), None)
        .await
        .unwrap();

    assert_eq!(updated.image, image);
    let stored = cart.load().await.unwrap();
    let entry = stored.get(&original.id).unwrap();
    assert_eq!(entry.product.name, "Thermos");
    assert_eq!(entry.product.price, Price::from_cents(450));
}

#[tokio::test]
async fn test_fetch_missing_product_is_not_found() {
    let memory = MemoryGateway::new();
    let gateway = Gateway::memory(&memory);
    let user = signed_in("u1");

    let err = product_list::fetch_product(&gateway, &user, &ProductId::new("nope"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}
