//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server errors are captured to
//! Sentry before the response is built; clients get a JSON body of the form
//! `{"error": "..."}`, plus `"details"` for provisioning failures. A handler
//! that panics is answered through [`panic_response`] with the same opaque
//! body as any other internal error.

use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::directory::DirectoryError;

/// Application-level error type for the wholesale service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Directory operation failed.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Checkout could not be completed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(CheckoutError::NotAuthorized(_)) => StatusCode::FORBIDDEN,
            Self::Checkout(CheckoutError::InvalidCart(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Directory(_)
            | Self::Internal(_)
            | Self::Checkout(CheckoutError::Directory(_) | CheckoutError::Provisioning(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Checkout(CheckoutError::NotAuthorized(_)) => {
                json!({"error": "Not a wholesale customer"})
            }
            Self::Checkout(CheckoutError::Provisioning(err)) => json!({
                "error": "Failed to create discount code",
                "details": err.details(),
            }),
            Self::Checkout(CheckoutError::InvalidCart(err)) => json!({"error": err.to_string()}),
            Self::Directory(_) | Self::Internal(_) | Self::Checkout(CheckoutError::Directory(_)) => {
                json!({"error": "Internal server error"})
            }
            Self::NotFound(msg) | Self::BadRequest(msg) => json!({"error": msg}),
        };

        (status, Json(body)).into_response()
    }
}

/// Response for a handler that panicked, for `CatchPanicLayer::custom`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    AppError::Internal(format!("handler panicked: {message}")).into_response()
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
