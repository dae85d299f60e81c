//! HTTP routes end to end, in-process.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use tower::ServiceExt;

use corner_shop_core::{Email, ProductId, UserId};
use corner_shop_integration_tests::{PASSWORD, seed_product, test_app};
use corner_shop_storefront::gateway::memory::{MemoryGateway, Operation};
use corner_shop_storefront::gateway::paths;

const FORM: &str = "application/x-www-form-urlencoded";

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::get(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post(app: &Router, uri: &str, body: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::post(uri).header(header::CONTENT_TYPE, FORM);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

/// Register Ana with one product and sign her in; returns the session
/// cookie and her uid.
async fn sign_in(app: &Router, memory: &MemoryGateway) -> (String, UserId) {
    let uid = memory.add_account(&Email::parse("ana@example.com").unwrap(), PASSWORD, Some("Ana"));
    seed_product(memory, &uid, "p1", "Thermos");

    let response = post(
        app,
        "/auth",
        &format!("email=ana%40example.com&password={PASSWORD}"),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/products");
    (session_cookie(&response), uid)
}

#[tokio::test]
async fn test_health() {
    let app = test_app(&MemoryGateway::new());

    let response = get(&app, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let app = test_app(&MemoryGateway::new());
    let request = Request::get("/health")
        .header("x-request-id", "edge-123")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "edge-123");
}

#[tokio::test]
async fn test_root_redirects_to_products() {
    let app = test_app(&MemoryGateway::new());

    let response = get(&app, "/", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/products");
}

#[tokio::test]
async fn test_products_require_sign_in() {
    let app = test_app(&MemoryGateway::new());

    let response = get(&app, "/products", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth");
}

#[tokio::test]
async fn test_empty_cart_without_sign_in() {
    let app = test_app(&MemoryGateway::new());

    let response = get(&app, "/cart", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_failed_sign_in_shows_toast() {
    let memory = MemoryGateway::new();
    let app = test_app(&memory);

    let response = post(&app, "/auth", "email=ana%40example.com&password=nope-nope", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Invalid email or password"));
}

#[tokio::test]
async fn test_signed_in_user_sees_products() {
    let memory = MemoryGateway::new();
    let app = test_app(&memory);
    let (cookie, _) = sign_in(&app, &memory).await;

    let response = get(&app, "/products", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Thermos"));
    assert!(body.contains("$4.50"));
    assert!(body.contains("Ana"));
}

#[tokio::test]
async fn test_add_to_cart_then_view_cart() {
    let memory = MemoryGateway::new();
    let app = test_app(&memory);
    let (cookie, _) = sign_in(&app, &memory).await;

    let response = post(&app, "/products/p1/cart", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = body_text(get(&app, "/cart", Some(&cookie)).await).await;
    assert!(body.contains("Thermos"));
    assert!(body.contains("1 items, subtotal $4.50"));

    let response = post(&app, "/cart/clear", "", Some(&cookie)).await;
    assert_eq!(location(&response), "/cart");

    let body = body_text(get(&app, "/cart", Some(&cookie)).await).await;
    assert!(body.contains("Your cart is empty."));
    assert!(body.contains("Cart cleared"));
}

#[tokio::test]
async fn test_delete_product() {
    let memory = MemoryGateway::new();
    let app = test_app(&memory);
    let (cookie, uid) = sign_in(&app, &memory).await;

    let response = post(&app, "/products/p1/delete", "", Some(&cookie)).await;
    assert_eq!(location(&response), "/products");
    assert!(memory.document(&paths::user_product(&uid, &ProductId::new("p1"))).is_none());

    let body = body_text(get(&app, "/products", Some(&cookie)).await).await;
    assert!(body.contains("Product deleted successfully"));
    assert!(!body.contains("Thermos"));
}

#[tokio::test]
async fn test_sign_out_keeps_cart() {
    let memory = MemoryGateway::new();
    let app = test_app(&memory);
    let (cookie, _) = sign_in(&app, &memory).await;
    post(&app, "/products/p1/cart", "", Some(&cookie)).await;

    let response = post(&app, "/auth/logout", "", Some(&cookie)).await;
    assert_eq!(location(&response), "/auth");

    let response = get(&app, "/products", Some(&cookie)).await;
    assert_eq!(location(&response), "/auth");

    let body = body_text(get(&app, "/cart", Some(&cookie)).await).await;
    assert!(body.contains("Thermos"));
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let memory = MemoryGateway::new();
    let app = test_app(&memory);
    let (cookie, _) = sign_in(&app, &memory).await;

    let response = get(&app, "/products/ghost/edit", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_delete_shows_provider_message() {
    let memory = MemoryGateway::new();
    let app = test_app(&memory);
    let (cookie, uid) = sign_in(&app, &memory).await;
    memory.fail(Operation::DeleteDocument, "Missing or insufficient permissions.");

    post(&app, "/products/p1/delete", "", Some(&cookie)).await;

    assert!(memory.document(&paths::user_product(&uid, &ProductId::new("p1"))).is_some());
    memory.clear_failures();
    let body = body_text(get(&app, "/products", Some(&cookie)).await).await;
    assert!(body.contains("Missing or insufficient permissions."));
    assert!(body.contains("Thermos"));
}
