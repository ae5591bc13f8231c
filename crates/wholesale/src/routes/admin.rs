//! Admin page and directory management API.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use peachtree_core::{Email, Money, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route(
            "/api/wholesale-customers",
            get(list_customers).post(add_customer),
        )
        .route("/api/wholesale-customers/{email}", delete(remove_customer))
        .route("/api/wholesale-prices", get(list_prices).post(set_price))
        .route("/api/wholesale-prices/{product_id}", delete(remove_price))
}

/// Price row for the admin page.
#[derive(Debug, Clone)]
pub struct PriceView {
    pub product_id: String,
    pub price: String,
}

/// Admin page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub customers: Vec<String>,
    pub prices: Vec<PriceView>,
}

/// Admin page: current customers and prices plus forms to change them.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<AdminTemplate> {
    let directory = state.directory();
    let customers = directory
        .list_customers()
        .await?
        .into_iter()
        .map(Email::into_inner)
        .collect();
    let prices = directory
        .list_prices()
        .await?
        .into_iter()
        .map(|(product_id, price)| PriceView {
            product_id: product_id.to_string(),
            price: price.to_string(),
        })
        .collect();

    Ok(AdminTemplate { customers, prices })
}

/// Request to register a wholesale customer.
#[derive(Debug, Deserialize)]
pub struct AddCustomerRequest {
    pub email: Email,
}

/// Response after registering a customer.
#[derive(Debug, Serialize)]
pub struct AddCustomerResponse {
    pub success: bool,
    pub email: Email,
}

/// List wholesale customers.
#[instrument(skip(state))]
pub async fn list_customers(State(state): State<AppState>) -> Result<Json<Vec<Email>>> {
    Ok(Json(state.directory().list_customers().await?))
}

/// Register a wholesale customer. Registering twice is not an error.
#[instrument(skip(state))]
pub async fn add_customer(
    State(state): State<AppState>,
    Json(body): Json<AddCustomerRequest>,
) -> Result<Json<AddCustomerResponse>> {
    if state.directory().add_customer(&body.email).await? {
        tracing::info!(email = %body.email, "Wholesale customer added");
    }

    Ok(Json(AddCustomerResponse {
        success: true,
        email: body.email,
    }))
}

/// Remove a wholesale customer.
#[instrument(skip(state))]
pub async fn remove_customer(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<StatusCode> {
    let email = Email::parse(&email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    if state.directory().remove_customer(&email).await? {
        tracing::info!(%email, "Wholesale customer removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("customer {email}")))
    }
}

/// Request to set a product's wholesale price.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPriceRequest {
    #[serde(alias = "product_id")]
    pub product_id: ProductId,
    pub price: Money,
}

/// Response after setting a price.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPriceResponse {
    pub success: bool,
    pub product_id: ProductId,
    pub price: Money,
}

/// List wholesale prices as a `{productId: price}` map.
#[instrument(skip(state))]
pub async fn list_prices(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<ProductId, Money>>> {
    Ok(Json(state.directory().list_prices().await?))
}

/// Set (or overwrite) a product's wholesale price.
#[instrument(skip(state))]
pub async fn set_price(
    State(state): State<AppState>,
    Json(body): Json<SetPriceRequest>,
) -> Result<impl IntoResponse> {
    state
        .directory()
        .set_price(&body.product_id, body.price)
        .await?;
    tracing::info!(product_id = %body.product_id, price = %body.price, "Wholesale price set");

    Ok(Json(SetPriceResponse {
        success: true,
        product_id: body.product_id,
        price: body.price,
    }))
}

/// Remove a product's wholesale price.
#[instrument(skip(state))]
pub async fn remove_price(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<StatusCode> {
    let product_id =
        ProductId::parse(&product_id).map_err(|e| AppError::BadRequest(e.to_string()))?;

    if state.directory().remove_price(&product_id).await? {
        tracing::info!(%product_id, "Wholesale price removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("price for product {product_id}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{TestApp, body_json, body_text};

    #[tokio::test]
    async fn test_add_and_list_customers() {
        let app = TestApp::new();

        let response = app
            .post_json("/api/wholesale-customers", &json!({"email": "b@c.com"}))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"success": true, "email": "b@c.com"})
        );

        app.post_json("/api/wholesale-customers", &json!({"email": "a@b.com"}))
            .await;
        app.post_json("/api/wholesale-customers", &json!({"email": "a@b.com"}))
            .await;

        let response = app.get("/api/wholesale-customers").await;
        assert_eq!(body_json(response).await, json!(["a@b.com", "b@c.com"]));
    }

    #[tokio::test]
    async fn test_add_customer_rejects_invalid_email() {
        let app = TestApp::new();

        let response = app
            .post_json("/api/wholesale-customers", &json!({"email": "not-an-email"}))
            .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(app.get("/api/wholesale-customers").await).await,
            json!([])
        );
    }

    #[tokio::test]
    async fn test_remove_customer() {
        let app = TestApp::new();
        app.post_json("/api/wholesale-customers", &json!({"email": "a@b.com"}))
            .await;

        let response = app.delete("/api/wholesale-customers/a@b.com").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.delete("/api/wholesale-customers/a@b.com").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_set_and_list_prices() {
        let app = TestApp::new();

        let response = app
            .post_json(
                "/api/wholesale-prices",
                &json!({"productId": "P1", "price": 10}),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"success": true, "productId": "P1", "price": "10.00"})
        );

        app.post_json(
            "/api/wholesale-prices",
            &json!({"productId": 8_123_456_789_u64, "price": "4.5"}),
        )
        .await;

        let response = app.get("/api/wholesale-prices").await;
        assert_eq!(
            body_json(response).await,
            json!({"8123456789": "4.50", "P1": "10.00"})
        );
    }

    #[tokio::test]
    async fn test_set_price_rejects_negative() {
        let app = TestApp::new();

        let response = app
            .post_json(
                "/api/wholesale-prices",
                &json!({"productId": "P1", "price": -1}),
            )
            .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_remove_price() {
        let app = TestApp::new();
        app.post_json(
            "/api/wholesale-prices",
            &json!({"productId": "P1", "price": 10}),
        )
        .await;

        assert_eq!(
            app.delete("/api/wholesale-prices/P1").await.status(),
            StatusCode::NO_CONTENT
        );
        assert_eq!(
            app.delete("/api/wholesale-prices/P1").await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_admin_page_lists_directory() {
        let app = TestApp::new();
        app.post_json("/api/wholesale-customers", &json!({"email": "a@b.com"}))
            .await;
        app.post_json(
            "/api/wholesale-prices",
            &json!({"productId": "P1", "price": 10}),
        )
        .await;

        let response = app.get("/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("a@b.com"));
        assert!(html.contains("10.00"));
    }
}
