//! Cart API tests against a mocked catalog service.
//!
//! Every request goes through the full router; the cart travels between
//! requests only as the signed cookie the previous response set.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use folio_integration_tests::TestStorefront;
use serde_json::json;
use wiremock::ResponseTemplate;

// =============================================================================
// Reading
// =============================================================================

#[tokio::test]
async fn empty_cart_without_cookie() {
    let store = TestStorefront::start().await;

    let response = store.get("/api/cart", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({ "items": [], "subtotal": "0.00", "totalItemCount": 0 })
    );
    assert!(response.set_cookie_header().is_none(), "reads never write the cookie");
}

#[tokio::test]
async fn tampered_cookie_reads_as_empty_cart() {
    let store = TestStorefront::start().await;
    let cookie = store.add_to_cart(None, "logo", 2, &[]).await;

    let (name_and_token, signature) = cookie.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('0') { "1" } else { "0" };
    let tampered = format!("{name_and_token}.{flipped}{}", &signature[1..]);

    let response = store.get("/api/cart", Some(&tampered)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["items"], json!([]));
}

#[tokio::test]
async fn garbage_cookie_reads_as_empty_cart() {
    let store = TestStorefront::start().await;

    let response = store
        .get("/api/cart", Some("folio_cart=not-a-token; other=1"))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["totalItemCount"], 0);
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn addon_price_scales_with_quantity() {
    let store = TestStorefront::start().await;

    let response = store
        .post_json(
            "/api/cart/add",
            &json!({ "productId": "web-design", "quantity": 1, "selectedAddons": ["ecommerce"] }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let cart = response.json();
    assert_eq!(cart["subtotal"], "45.00");
    assert_eq!(cart["totalItemCount"], 1);
    assert_eq!(cart["items"][0]["unitPrice"], "45.00");
    assert_eq!(cart["items"][0]["addons"][0]["id"], "ecommerce");

    let cookie = response.cart_cookie().unwrap();
    let response = store
        .post_json(
            "/api/cart/quantity",
            &json!({ "productId": "web-design", "quantity": 2 }),
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let cart = response.json();
    assert_eq!(cart["subtotal"], "90.00");
    assert_eq!(cart["totalItemCount"], 2);
    assert_eq!(cart["items"][0]["lineTotal"], "90.00");
}

#[tokio::test]
async fn cookie_carries_cart_between_requests() {
    let store = TestStorefront::start().await;

    let cookie = store.add_to_cart(None, "logo", 1, &[]).await;
    let cookie = store.add_to_cart(Some(&cookie), "web-design", 1, &[]).await;
    let cookie = store.add_to_cart(Some(&cookie), "logo", 2, &[]).await;

    let cart = store.get("/api/cart", Some(&cookie)).await.json();

    let ids: Vec<_> = cart["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["productId"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["logo", "web-design"], "lines keep insertion order");
    assert_eq!(cart["items"][0]["quantity"], 3);
    assert_eq!(cart["subtotal"], "60.30");
    assert_eq!(cart["totalItemCount"], 4);
}

#[tokio::test]
async fn set_addons_replaces_selection() {
    let store = TestStorefront::start().await;
    let cookie = store
        .add_to_cart(None, "web-design", 1, &["ecommerce"])
        .await;

    let response = store
        .post_json(
            "/api/cart/addons",
            &json!({ "productId": "web-design", "selectedAddons": ["seo"] }),
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let cart = response.json();
    assert_eq!(cart["items"][0]["selectedAddons"], json!(["seo"]));
    assert_eq!(cart["subtotal"], "35.50");
}

#[tokio::test]
async fn quantity_zero_and_remove_drop_lines() {
    let store = TestStorefront::start().await;
    let cookie = store.add_to_cart(None, "logo", 1, &[]).await;
    let cookie = store.add_to_cart(Some(&cookie), "web-design", 1, &[]).await;

    let response = store
        .post_json(
            "/api/cart/quantity",
            &json!({ "productId": "logo", "quantity": 0 }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["items"].as_array().unwrap().len(), 1);
    let cookie = response.cart_cookie().unwrap();

    let response = store
        .post_json("/api/cart/remove", &json!({ "productId": "web-design" }), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["items"], json!([]));
}

#[tokio::test]
async fn clear_empties_cart() {
    let store = TestStorefront::start().await;
    let cookie = store.add_to_cart(None, "logo", 3, &[]).await;

    let response = store.post_json("/api/cart/clear", &json!({}), Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["totalItemCount"], 0);

    let cleared = response.cart_cookie().unwrap();
    assert_ne!(cleared, cookie);
    let cart = store.get("/api/cart", Some(&cleared)).await.json();
    assert_eq!(cart["items"], json!([]));
}

#[tokio::test]
async fn cart_cookie_attributes() {
    let store = TestStorefront::start().await;

    let response = store
        .post_json("/api/cart/add", &json!({ "productId": "logo" }), None)
        .await;

    let header = response.set_cookie_header().unwrap();
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("SameSite=Lax"));
    assert!(header.contains("Path=/"));
    assert!(header.contains("Max-Age=604800"));
    assert!(!header.contains("Secure"), "plain http base URL should not set Secure");
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn unknown_product_is_not_found() {
    let store = TestStorefront::start().await;

    let response = store
        .post_json("/api/cart/add", &json!({ "productId": "nope" }), None)
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["error"], "Product not found: nope");
    assert!(response.set_cookie_header().is_none());
}

#[tokio::test]
async fn skipped_catalog_product_cannot_be_added() {
    let store = TestStorefront::start().await;

    let response = store
        .post_json("/api/cart/add", &json!({ "productId": "broken" }), None)
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_addon_is_rejected() {
    let store = TestStorefront::start().await;

    let response = store
        .post_json(
            "/api/cart/add",
            &json!({ "productId": "web-design", "selectedAddons": ["hosting"] }),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bad_add_requests_are_rejected() {
    let store = TestStorefront::start().await;

    for body in [
        json!({ "productId": "logo", "quantity": 0 }),
        json!({ "productId": "   " }),
        json!({ "quantity": 1 }),
        json!({ "productId": "logo", "quantity": "two" }),
    ] {
        let response = store.post_json("/api/cart/add", &body, None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "body: {body}");
        assert!(response.json()["error"].is_string());
    }
}

#[tokio::test]
async fn cart_that_outgrows_the_cookie_is_rejected() {
    let products: Vec<_> = (0..80)
        .map(|i| {
            json!({
                "id": format!("custom-illustration-package-{i:03}"),
                "name": format!("Illustration {i}"),
                "price": "25.00"
            })
        })
        .collect();
    let store =
        TestStorefront::start_with_catalog(ResponseTemplate::new(200).set_body_json(products))
            .await;

    let mut cookie: Option<String> = None;
    let mut saved_lines = 0;
    let mut rejected = None;
    for i in 0..80 {
        let response = store
            .post_json(
                "/api/cart/add",
                &json!({ "productId": format!("custom-illustration-package-{i:03}") }),
                cookie.as_deref(),
            )
            .await;
        if response.status != StatusCode::OK {
            rejected = Some(response);
            break;
        }
        let header = response.set_cookie_header().unwrap();
        assert!(header.len() <= 4096, "oversized cookie was sent: {} bytes", header.len());
        cookie = response.cart_cookie();
        saved_lines += 1;
    }

    let rejected = rejected.expect("cart never hit the cookie size limit");
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert!(rejected.set_cookie_header().is_none());
    assert!(rejected.json()["error"].as_str().unwrap().contains("cart is full"));

    let cart = store.get("/api/cart", cookie.as_deref()).await.json();
    assert_eq!(cart["items"].as_array().unwrap().len(), saved_lines);
}

// =============================================================================
// Catalog availability
// =============================================================================

#[tokio::test]
async fn products_lists_valid_catalog_entries() {
    let store = TestStorefront::start().await;

    let response = store.get("/api/products", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let products = response.json();
    assert_eq!(products.as_array().unwrap().len(), 2);
    assert_eq!(products[0]["id"], "web-design");
    assert_eq!(products[0]["addons"][1]["price"], "5.50");
}

#[tokio::test]
async fn catalog_outage_is_bad_gateway() {
    let store = TestStorefront::start_with_catalog(ResponseTemplate::new(503)).await;

    let products = store.get("/api/products", None).await;
    assert_eq!(products.status, StatusCode::BAD_GATEWAY);
    assert_eq!(products.json()["error"], "Product catalog is unavailable");

    let add = store
        .post_json("/api/cart/add", &json!({ "productId": "logo" }), None)
        .await;
    assert_eq!(add.status, StatusCode::BAD_GATEWAY);
    assert!(add.set_cookie_header().is_none());
}

#[tokio::test]
async fn readiness_follows_catalog() {
    let healthy = TestStorefront::start().await;
    let before = chrono::Utc::now();
    let response = healthy.get("/health/ready", None).await;
    assert_eq!(response.status, StatusCode::OK);
    let report = response.json();
    assert_eq!(report["status"], "ready");
    assert_eq!(report["products"], 2);
    let fetched_at: chrono::DateTime<chrono::Utc> =
        report["catalogFetchedAt"].as_str().unwrap().parse().unwrap();
    assert!(fetched_at >= before);

    let again = healthy.get("/health/ready", None).await.json();
    assert_eq!(
        again["catalogFetchedAt"], report["catalogFetchedAt"],
        "cached snapshot keeps its fetch time"
    );

    let broken =
        TestStorefront::start_with_catalog(ResponseTemplate::new(200).set_body_string("{}")).await;
    let response = broken.get("/health/ready", None).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json(), json!({ "status": "unavailable" }));
    assert_eq!(broken.get("/health", None).await.text(), "ok");
}

#[tokio::test]
async fn catalog_is_fetched_once_while_cached() {
    let store = TestStorefront::start().await;

    store.get("/api/products", None).await;
    store.get("/api/cart", None).await;
    store.get("/api/products", None).await;

    let fetches = store.catalog_server.received_requests().await.unwrap();
    assert_eq!(fetches.len(), 1);
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let store = TestStorefront::start().await;

    let response = store.get("/api/cart", None).await;

    assert!(response.headers.get("x-request-id").is_some());
    assert_eq!(response.headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(response.headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(response.headers.get("cache-control").unwrap(), "no-store, max-age=0");
}
