//! PeachTree Wholesale library.
//!
//! Serves wholesale pricing for a Shopify storefront:
//!
//! - an admin page and JSON API to manage wholesale customers and prices
//! - lookups the storefront theme uses to render wholesale prices
//! - a checkout endpoint that reconciles the cart against wholesale prices
//!   and, when wholesale is cheaper, issues a single-use discount code through
//!   the Shopify Admin REST API
//!
//! The binary in `main.rs` wires configuration, tracing and Sentry around
//! [`app`]; the library is what the tests drive.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod code;
pub mod config;
pub mod directory;
pub mod error;
pub mod middleware;
pub mod pricing;
pub mod provision;
pub mod routes;
pub mod shopify;
pub mod state;

#[cfg(test)]
mod test_support;

use std::time::Duration;

use axum::{
    Router,
    http::{Request, Response},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::state::AppState;

/// Build the application router with its middleware stack.
///
/// `cors_origins` lists the origins allowed to call the API; an empty list
/// allows any origin.
pub fn app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(routes::routes())
        .with_state(state)
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .layer(middleware::cors_layer(cors_origins))
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
