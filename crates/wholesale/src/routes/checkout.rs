//! Wholesale checkout endpoint called by the storefront theme.

use axum::{Json, Router, extract::State, routing::post};
use chrono::{DateTime, Utc};
use peachtree_core::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::checkout::CheckoutDirective;
use crate::error::Result;
use crate::pricing::CartItem;
use crate::state::AppState;

/// Build the checkout router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/process-wholesale-checkout", post(process_checkout))
}

/// Checkout request as sent by the theme's cart script.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Any identity the theme knows; only registered emails are authorized.
    #[serde(alias = "customerIdentity")]
    pub customer_email: String,
    pub cart_items: Vec<CartItem>,
    #[serde(deserialize_with = "peachtree_core::non_negative_decimal")]
    pub cart_total: Decimal,
}

/// Checkout response; discount fields are present only when a code was issued.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub requires_discount: bool,
    pub checkout_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wholesale_total: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<CheckoutDirective> for CheckoutResponse {
    fn from(directive: CheckoutDirective) -> Self {
        match directive {
            CheckoutDirective::Passthrough { checkout_url } => Self {
                requires_discount: false,
                checkout_url,
                discount_code: None,
                discount_amount: None,
                wholesale_total: None,
                expires_at: None,
            },
            CheckoutDirective::Discount(issued) => Self {
                requires_discount: true,
                checkout_url: issued.checkout_url,
                discount_code: Some(issued.code),
                discount_amount: Some(issued.amount),
                wholesale_total: Some(issued.wholesale_total),
                expires_at: Some(issued.expires_at),
            },
        }
    }
}

/// Reconcile the cart and, when wholesale is cheaper, issue a discount code.
#[instrument(skip(state, body), fields(customer = %body.customer_email))]
pub async fn process_checkout(
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let directive = state
        .checkout()
        .process(&body.customer_email, &body.cart_items, body.cart_total)
        .await?;

    Ok(Json(directive.into()))
}
