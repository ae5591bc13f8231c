//! HTTP middleware stack for the wholesale service.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, one hub per request)
//! 2. CORS (the storefront theme calls the API cross-origin)
//! 3. `TraceLayer` (request tracing, span carries `request_id`)
//! 4. Request ID (add unique ID to each request)
//! 5. Catch panic (a panicking handler answers 500 instead of dropping the
//!    connection)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// CORS for the storefront theme.
///
/// An empty origin list allows any origin.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::HeaderName::from_static(REQUEST_ID_HEADER)]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin: {e}");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
