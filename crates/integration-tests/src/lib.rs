//! Integration test harness for PeachTree Wholesale.
//!
//! Each test boots two real HTTP servers on ephemeral ports:
//!
//! - a fake Shopify Admin REST API that records what it receives and answers
//!   according to a [`ShopifyBehavior`]
//! - the wholesale service itself, built with [`peachtree_wholesale::app`]
//!   and pointed at the fake
//!
//! Tests then talk to the wholesale service over HTTP with `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p peachtree-integration-tests
//!
//! # Include the PostgreSQL-backed tests
//! WHOLESALE_TEST_DATABASE_URL=postgres://... cargo test -p peachtree-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use peachtree_wholesale::code::SystemClock;
use peachtree_wholesale::config::{DiscountPolicy, ShopifyAdminConfig};
use peachtree_wholesale::directory::{InMemoryDirectory, WholesaleDirectory};
use peachtree_wholesale::shopify::ShopifyClient;
use peachtree_wholesale::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};

/// Admin API version the fake serves.
pub const API_VERSION: &str = "2023-10";

/// Access token the service is configured with.
pub const ACCESS_TOKEN: &str = "shpat_integration_9f8e7d6c5b4a";

/// How the fake Shopify answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShopifyBehavior {
    /// Both calls succeed.
    #[default]
    Succeed,
    /// Price rule creation answers 422.
    RejectPriceRule,
    /// Price rule succeeds, discount code creation answers 500.
    RejectDiscountCode,
    /// Price rule creation answers 201 without an id.
    OmitPriceRuleId,
    /// Price rule creation never answers within the client timeout.
    Stall,
}

/// A request the fake received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub access_token: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct FakeState {
    behavior: ShopifyBehavior,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    next_id: Arc<AtomicI64>,
}

impl FakeState {
    fn record(&self, path: String, headers: &HeaderMap, body: Value) {
        let access_token = headers
            .get("x-shopify-access-token")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.recorded.lock().unwrap().push(RecordedRequest {
            path,
            access_token,
            body,
        });
    }
}

async fn create_price_rule(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("/price_rules.json".to_string(), &headers, body.clone());

    match state.behavior {
        ShopifyBehavior::RejectPriceRule => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"errors": {"value": ["must be less than or equal to 0"]}})),
        )
            .into_response(),
        ShopifyBehavior::OmitPriceRuleId => (
            StatusCode::CREATED,
            Json(json!({"price_rule": {"title": body["price_rule"]["title"]}})),
        )
            .into_response(),
        ShopifyBehavior::Stall => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        ShopifyBehavior::Succeed | ShopifyBehavior::RejectDiscountCode => {
            let id = state.next_id.fetch_add(1, Ordering::SeqCst);
            let mut rule = body["price_rule"].clone();
            rule["id"] = json!(id);
            (StatusCode::CREATED, Json(json!({"price_rule": rule}))).into_response()
        }
    }
}

async fn create_discount_code(
    State(state): State<FakeState>,
    Path(price_rule_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(
        format!("/price_rules/{price_rule_id}/discount_codes.json"),
        &headers,
        body.clone(),
    );

    if state.behavior == ShopifyBehavior::RejectDiscountCode {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"errors": "Internal Server Error"})),
        )
            .into_response();
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::CREATED,
        Json(json!({
            "discount_code": {
                "id": id,
                "price_rule_id": price_rule_id,
                "code": body["discount_code"]["code"],
                "usage_count": 0
            }
        })),
    )
        .into_response()
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A fake Shopify Admin REST API.
pub struct FakeShopify {
    pub base_url: String,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeShopify {
    /// Start the fake on an ephemeral port.
    pub async fn start(behavior: ShopifyBehavior) -> Self {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            behavior,
            recorded: Arc::clone(&recorded),
            next_id: Arc::new(AtomicI64::new(1_000_001)),
        };

        let prefix = format!("/admin/api/{API_VERSION}");
        let router = Router::new()
            .route(&format!("{prefix}/price_rules.json"), post(create_price_rule))
            .route(
                &format!("{prefix}/price_rules/{{id}}/discount_codes.json"),
                post(create_discount_code),
            )
            .with_state(state);

        let addr = spawn(router).await;
        Self {
            base_url: format!("http://{addr}{prefix}"),
            recorded,
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded.lock().unwrap().clone()
    }
}

/// A running wholesale service wired to a fake Shopify.
pub struct TestContext {
    pub client: reqwest::Client,
    pub base_url: String,
    pub shopify: FakeShopify,
    pub directory: Arc<dyn WholesaleDirectory>,
}

impl TestContext {
    /// Start with an in-memory directory and an 8 second Shopify timeout.
    pub async fn start(behavior: ShopifyBehavior) -> Self {
        Self::start_with(
            behavior,
            Arc::new(InMemoryDirectory::new()),
            Duration::from_secs(8),
        )
        .await
    }

    /// Start with an explicit directory and Shopify timeout.
    pub async fn start_with(
        behavior: ShopifyBehavior,
        directory: Arc<dyn WholesaleDirectory>,
        shopify_timeout: Duration,
    ) -> Self {
        let shopify = FakeShopify::start(behavior).await;

        let config = ShopifyAdminConfig {
            store: "peachtree-test.myshopify.com".to_string(),
            api_version: API_VERSION.to_string(),
            access_token: SecretString::from(ACCESS_TOKEN),
            request_timeout: shopify_timeout,
        };
        let platform = ShopifyClient::with_base_url(&config, shopify.base_url.clone()).unwrap();

        let state = AppState::new(
            Arc::clone(&directory),
            Arc::new(platform),
            Arc::new(SystemClock),
            DiscountPolicy::default(),
        );
        let addr = spawn(peachtree_wholesale::app(state, &[])).await;

        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{addr}"),
            shopify,
            directory,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(body).send().await.unwrap()
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client.delete(self.url(path)).send().await.unwrap()
    }

    /// Register `email` and set each `(product, price)` through the HTTP API.
    pub async fn seed(&self, email: &str, prices: &[(&str, &str)]) {
        let response = self
            .post("/api/wholesale-customers", &json!({"email": email}))
            .await;
        assert!(response.status().is_success());

        for (product_id, price) in prices {
            let response = self
                .post(
                    "/api/wholesale-prices",
                    &json!({"productId": product_id, "price": price}),
                )
                .await;
            assert!(response.status().is_success());
        }
    }

    /// POST a checkout and return status and JSON body.
    pub async fn checkout(&self, body: &Value) -> (reqwest::StatusCode, Value) {
        let response = self.post("/api/process-wholesale-checkout", body).await;
        let status = response.status();
        (status, response.json().await.unwrap())
    }
}
