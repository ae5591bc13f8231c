//! Lookups used by the storefront theme to render wholesale prices.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use peachtree_core::{Email, Money, ProductId};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the theme router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/check-wholesale/{email}", get(check_wholesale))
        .route("/api/wholesale-price/{product_id}", get(wholesale_price))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckWholesaleResponse {
    pub is_wholesale: bool,
}

#[derive(Debug, Serialize)]
pub struct WholesalePriceResponse {
    pub price: Option<Money>,
}

/// Whether an email belongs to a wholesale customer.
///
/// A string that is not a valid email cannot be registered, so it is simply
/// not a wholesale customer.
#[instrument(skip(state))]
pub async fn check_wholesale(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<CheckWholesaleResponse>> {
    let is_wholesale = match Email::parse(&email) {
        Ok(email) => state.directory().is_wholesale_customer(&email).await?,
        Err(_) => false,
    };

    Ok(Json(CheckWholesaleResponse { is_wholesale }))
}

/// A product's wholesale price, or `null` when none is set.
#[instrument(skip(state))]
pub async fn wholesale_price(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<WholesalePriceResponse>> {
    let product_id =
        ProductId::parse(&product_id).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let price = state.directory().wholesale_price_of(&product_id).await?;

    Ok(Json(WholesalePriceResponse { price }))
}
