//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding. All route handlers return `Result<T, AppError>`, and
//! every error renders as a JSON body `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::commerce::CommerceError;
use crate::services::{CartError, CheckoutError};

/// Application-level error type for the storefront API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Region or cart absent. Expected, drives a "not found" page state.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The commerce backend errored. Not retried here.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[from] CommerceError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BackendUnavailable(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            // The cart endpoint treats an unserved country as bad input.
            err @ (CartError::RegionNotFound(_)
            | CartError::NoCartFound
            | CartError::NoValidFields
            | CartError::InvalidField { .. }) => Self::Validation(err.to_string()),
            CartError::Backend(e) => Self::BackendUnavailable(e),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Cart(CartError::RegionNotFound(country)) => {
                Self::NotFound(format!("no region for country {country}"))
            }
            CheckoutError::Cart(err) => err.into(),
            CheckoutError::Methods(e) => Self::BackendUnavailable(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::BackendUnavailable(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::BackendUnavailable(_) => "Commerce backend unavailable, please try again".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(msg) | Self::Validation(msg) => msg.clone(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
