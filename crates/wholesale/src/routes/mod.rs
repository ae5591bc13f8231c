//! HTTP route handlers for the wholesale service.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                             - Liveness
//! GET    /health/ready                       - Readiness (directory reachable)
//!
//! # Admin
//! GET    /                                   - Admin page
//! GET    /api/wholesale-customers            - List customers
//! POST   /api/wholesale-customers            - Add customer
//! DELETE /api/wholesale-customers/{email}    - Remove customer
//! GET    /api/wholesale-prices               - List prices
//! POST   /api/wholesale-prices               - Set price
//! DELETE /api/wholesale-prices/{product_id}  - Remove price
//!
//! # Storefront theme
//! GET    /api/check-wholesale/{email}        - Membership check
//! GET    /api/wholesale-price/{product_id}   - Price lookup
//! POST   /api/process-wholesale-checkout     - Checkout entry point
//! ```

pub mod admin;
pub mod checkout;
pub mod theme;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(admin::router())
        .merge(theme::router())
        .merge(checkout::router())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the directory is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.directory().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
