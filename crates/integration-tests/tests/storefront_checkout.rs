//! Checkout API tests against mocked catalog and payment provider servers.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use folio_core::{OrderMetadata, ProductId};
use folio_integration_tests::{CHECKOUT_SESSIONS_PATH, TestStorefront, form_field};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn checkout_returns_hosted_session() {
    let store = TestStorefront::start().await;
    Mock::given(method("POST"))
        .and(path(CHECKOUT_SESSIONS_PATH))
        .and(header("authorization", "Bearer sk_test_integration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_abc",
            "url": "https://checkout.example.test/pay/cs_test_abc"
        })))
        .expect(1)
        .mount(&store.payments_server)
        .await;
    let cookie = store.add_to_cart(None, "logo", 1, &[]).await;

    let response = store.post_json("/api/checkout", &json!({}), Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    assert_eq!(
        response.json(),
        json!({
            "sessionId": "cs_test_abc",
            "url": "https://checkout.example.test/pay/cs_test_abc"
        })
    );
    assert!(response.set_cookie_header().is_none(), "checkout leaves the cart alone");
}

#[tokio::test]
async fn checkout_form_lists_products_and_addons() {
    let store = TestStorefront::start().await;
    store.accept_checkout("cs_test_form").await;
    let cookie = store
        .add_to_cart(None, "web-design", 1, &["ecommerce"])
        .await;
    let response = store
        .post_json(
            "/api/cart/quantity",
            &json!({ "productId": "web-design", "quantity": 2 }),
            Some(&cookie),
        )
        .await;
    let cookie = response.cart_cookie().unwrap();

    let response = store.post_json("/api/checkout", &json!({}), Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);

    let requests = store.checkout_requests().await;
    assert_eq!(requests.len(), 1);
    let form = &requests[0];

    assert_eq!(form_field(form, "mode"), Some("payment"));
    assert_eq!(
        form_field(form, "success_url"),
        Some("http://localhost:3000/checkout/success?session_id={CHECKOUT_SESSION_ID}")
    );
    assert_eq!(form_field(form, "cancel_url"), Some("http://localhost:3000/cart"));

    assert_eq!(form_field(form, "line_items[0][quantity]"), Some("2"));
    assert_eq!(form_field(form, "line_items[0][price_data][currency]"), Some("usd"));
    assert_eq!(form_field(form, "line_items[0][price_data][unit_amount]"), Some("3000"));
    assert_eq!(
        form_field(form, "line_items[0][price_data][product_data][name]"),
        Some("Website Design")
    );
    assert_eq!(
        form_field(form, "line_items[0][price_data][product_data][description]"),
        Some("Custom multi-page site")
    );

    assert_eq!(form_field(form, "line_items[1][quantity]"), Some("2"));
    assert_eq!(form_field(form, "line_items[1][price_data][unit_amount]"), Some("1500"));
    assert_eq!(
        form_field(form, "line_items[1][price_data][product_data][name]"),
        Some("E-commerce (Addon)")
    );
    assert_eq!(
        form_field(form, "line_items[1][price_data][product_data][description]"),
        None,
        "blank descriptions are omitted"
    );
    assert_eq!(form_field(form, "line_items[2][quantity]"), None);

    let metadata = OrderMetadata::parse(form_field(form, "metadata[cart]").unwrap()).unwrap();
    assert_eq!(metadata.items.len(), 1);
    assert_eq!(metadata.items[0].product_id, ProductId::new("web-design"));
    assert_eq!(metadata.items[0].quantity, 2);
    assert_eq!(metadata.items[0].selected_addon_ids.len(), 1);
}

#[tokio::test]
async fn empty_cart_never_reaches_provider() {
    let store = TestStorefront::start().await;
    Mock::given(method("POST"))
        .and(path(CHECKOUT_SESSIONS_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&store.payments_server)
        .await;

    let response = store.post_json("/api/checkout", &json!({}), None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Your cart is empty");
}

#[tokio::test]
async fn provider_failure_is_bad_gateway_and_keeps_cart() {
    let store = TestStorefront::start().await;
    Mock::given(method("POST"))
        .and(path(CHECKOUT_SESSIONS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "type": "api_error", "message": "Something went wrong" }
        })))
        .mount(&store.payments_server)
        .await;
    let cookie = store.add_to_cart(None, "logo", 2, &[]).await;

    let response = store.post_json("/api/checkout", &json!({}), Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.json()["error"], "Payment provider error");
    assert!(response.set_cookie_header().is_none());

    let cart = store.get("/api/cart", Some(&cookie)).await.json();
    assert_eq!(cart["totalItemCount"], 2);
}

#[tokio::test]
async fn provider_rate_limit_is_bad_gateway() {
    let store = TestStorefront::start().await;
    Mock::given(method("POST"))
        .and(path(CHECKOUT_SESSIONS_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
        .mount(&store.payments_server)
        .await;
    let cookie = store.add_to_cart(None, "logo", 1, &[]).await;

    let response = store.post_json("/api/checkout", &json!({}), Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn oversized_order_summary_is_rejected() {
    let products: Vec<_> = (0..40)
        .map(|i| {
            json!({
                "id": format!("svc-{i:02}"),
                "name": format!("Consulting session {i}"),
                "price": "1.00"
            })
        })
        .collect();
    let store =
        TestStorefront::start_with_catalog(ResponseTemplate::new(200).set_body_json(products))
            .await;
    store.accept_checkout("cs_never").await;

    let mut cookie: Option<String> = None;
    for i in 0..40 {
        let id = format!("svc-{i:02}");
        cookie = Some(store.add_to_cart(cookie.as_deref(), &id, 1, &[]).await);
    }

    let response = store
        .post_json("/api/checkout", &json!({}), cookie.as_deref())
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(store.checkout_requests().await.is_empty());
}
