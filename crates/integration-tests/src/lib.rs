//! End-to-end test harness for the Folio Shop storefront.
//!
//! Each [`TestStorefront`] runs the real router in-process against two
//! `wiremock` servers: one serving the product catalog and one standing in
//! for the payment provider. Requests go through `tower::ServiceExt::oneshot`,
//! so no port is bound for the storefront itself.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p folio-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use folio_core::CurrencyCode;
use folio_storefront::config::{CatalogConfig, CatalogSource, PaymentsConfig, StorefrontConfig};
use folio_storefront::services::CART_COOKIE_NAME;
use folio_storefront::state::AppState;
use folio_storefront::{RateLimiting, app};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the catalog mock serves the product list on.
pub const CATALOG_PATH: &str = "/catalog.json";

/// Path the payment provider mock accepts checkout sessions on.
pub const CHECKOUT_SESSIONS_PATH: &str = "/v1/checkout/sessions";

const CART_SECRET: &str = "Zq8vR2mX7kT4nB9wL3pF6hJ1sD5gC0aE";
const PAYMENTS_SECRET_KEY: &str = "sk_test_integration";
const WEBHOOK_SECRET: &str = "whsec_integration_secret";

/// Catalog used by most tests.
///
/// `web-design` carries two add-ons, `logo` has none, and the last record is
/// invalid (negative price) so the catalog loader has something to skip.
#[must_use]
pub fn sample_catalog() -> Value {
    json!([
        {
            "id": "web-design",
            "name": "Website Design",
            "description": "Custom multi-page site",
            "price": "30.00",
            "image": "/images/web-design.png",
            "tags": ["web"],
            "addons": [
                { "id": "ecommerce", "name": "E-commerce", "price": "15.00" },
                { "id": "seo", "name": "SEO Package", "price": "5.50" }
            ]
        },
        {
            "id": "logo",
            "name": "Logo Design",
            "price": "10.10"
        },
        {
            "id": "broken",
            "name": "Broken Product",
            "price": "-1.00"
        }
    ])
}

/// A storefront wired to mock catalog and payment provider servers.
pub struct TestStorefront {
    pub catalog_server: MockServer,
    pub payments_server: MockServer,
    pub state: AppState,
    router: Router,
}

impl TestStorefront {
    /// Start a storefront serving [`sample_catalog`].
    pub async fn start() -> Self {
        Self::start_with_catalog(ResponseTemplate::new(200).set_body_json(sample_catalog())).await
    }

    /// Start a storefront whose catalog service answers with `catalog`.
    pub async fn start_with_catalog(catalog: ResponseTemplate) -> Self {
        let catalog_server = MockServer::start().await;
        let payments_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(CATALOG_PATH))
            .respond_with(catalog)
            .mount(&catalog_server)
            .await;

        let config = test_config(&catalog_server.uri(), &payments_server.uri());
        let state = AppState::new(config);
        let router = app(state.clone(), RateLimiting::Disabled);

        Self {
            catalog_server,
            payments_server,
            state,
            router,
        }
    }

    /// Send a request through the full middleware stack.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// `GET` a path, optionally presenting a cart cookie.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("valid request"))
            .await
    }

    /// `POST` a JSON body, optionally presenting a cart cookie.
    pub async fn post_json(&self, uri: &str, body: &Value, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(
            builder
                .body(Body::from(body.to_string()))
                .expect("valid request"),
        )
        .await
    }

    /// `POST` a raw webhook body with the given signature header.
    pub async fn post_webhook(&self, body: &[u8], signature: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/webhooks/payments")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(signature) = signature {
            builder = builder.header("stripe-signature", signature);
        }
        self.send(builder.body(Body::from(body.to_vec())).expect("valid request"))
            .await
    }

    /// Sign a webhook body the way the provider would, timestamped now.
    #[must_use]
    pub fn sign_webhook(&self, body: &[u8]) -> String {
        self.state
            .webhooks()
            .signature_header(chrono::Utc::now().timestamp(), body)
            .expect("signing with a test secret succeeds")
    }

    /// Have the provider mock accept checkout sessions.
    pub async fn accept_checkout(&self, session_id: &str) {
        Mock::given(method("POST"))
            .and(path(CHECKOUT_SESSIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": session_id,
                "object": "checkout.session",
                "url": format!("https://checkout.example.test/pay/{session_id}"),
            })))
            .mount(&self.payments_server)
            .await;
    }

    /// Form fields of every checkout session request the provider received.
    pub async fn checkout_requests(&self) -> Vec<Vec<(String, String)>> {
        self.payments_server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == CHECKOUT_SESSIONS_PATH)
            .map(|request| {
                url::form_urlencoded::parse(&request.body)
                    .into_owned()
                    .collect()
            })
            .collect()
    }

    /// Add a product to a cart and return the updated cookie.
    pub async fn add_to_cart(
        &self,
        cookie: Option<&str>,
        product_id: &str,
        quantity: i64,
        addons: &[&str],
    ) -> String {
        let response = self
            .post_json(
                "/api/cart/add",
                &json!({
                    "productId": product_id,
                    "quantity": quantity,
                    "selectedAddons": addons,
                }),
                cookie,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "add failed: {}", response.text());
        response.cart_cookie().expect("add sets the cart cookie")
    }
}

/// A buffered storefront response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Parse the body as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", self.text()))
    }

    /// The body as text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The cart `Set-Cookie` header, in full.
    #[must_use]
    pub fn set_cookie_header(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(&format!("{CART_COOKIE_NAME}=")))
            .map(ToString::to_string)
    }

    /// The cart cookie as a browser would send it back (`name=value`).
    #[must_use]
    pub fn cart_cookie(&self) -> Option<String> {
        self.set_cookie_header()
            .and_then(|header| header.split(';').next().map(ToString::to_string))
    }
}

fn test_config(catalog_base: &str, payments_base: &str) -> StorefrontConfig {
    let catalog_url =
        Url::parse(&format!("{catalog_base}{CATALOG_PATH}")).expect("mock server URI is a URL");

    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        cart_secret: SecretString::from(CART_SECRET.to_string()),
        catalog: CatalogConfig {
            source: CatalogSource::Http(catalog_url),
            cache_ttl: Duration::from_secs(60),
        },
        payments: PaymentsConfig {
            api_base: payments_base.to_string(),
            secret_key: SecretString::from(PAYMENTS_SECRET_KEY.to_string()),
            webhook_secret: SecretString::from(WEBHOOK_SECRET.to_string()),
            currency: CurrencyCode::USD,
            success_url: "http://localhost:3000/checkout/success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "http://localhost:3000/cart".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Look up a form field by key.
#[must_use]
pub fn form_field<'a>(fields: &'a [(String, String)], key: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}
