//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness check
//!
//! # Regions
//! GET    /api/regions/{country_code}  - Region for a country (404 if none)
//!
//! # Cart
//! GET    /api/cart?country_code=uk    - Lookup-or-create
//! POST   /api/cart                    - Lookup-or-create, country in JSON body
//! PATCH  /api/cart                    - Allow-listed update of the referenced cart
//!
//! # Cart reference
//! GET    /api/cart-id                 - Current reference
//! POST   /api/cart-id                 - Consent-gated set
//! DELETE /api/cart-id                 - Immediately-expiring clear
//!
//! # Consent
//! POST   /api/consent                 - Record a decision; declining clears client state
//!
//! # Checkout
//! GET    /api/checkout/{country_code} - Composed checkout payload
//! ```
//!
//! JSON envelopes use camelCase keys; entities inside them keep the
//! backend's snake_case.

pub mod cart;
pub mod cart_id;
pub mod checkout;
pub mod consent;
pub mod regions;

use axum::{
    Router,
    routing::{get, post},
};
use tidewater_core::{CountryCode, CountryCodeError};

use crate::error::AppError;
use crate::state::AppState;

/// Create the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/regions/{country_code}", get(regions::show))
        .route(
            "/api/cart",
            get(cart::show).post(cart::create).patch(cart::update),
        )
        .route(
            "/api/cart-id",
            get(cart_id::show).post(cart_id::set).delete(cart_id::clear),
        )
        .route("/api/consent", post(consent::decide))
        .route("/api/checkout/{country_code}", get(checkout::show))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}

/// Parse a country code where an unserved or malformed code is bad input.
fn country_or_invalid(raw: Option<&str>) -> Result<CountryCode, AppError> {
    let raw = raw.ok_or_else(|| AppError::Validation("country_code is required".to_string()))?;
    CountryCode::parse(raw).map_err(|e| AppError::Validation(e.to_string()))
}

/// Parse a country code where a malformed code is just an unknown one.
fn country_or_not_found(raw: &str) -> Result<CountryCode, AppError> {
    CountryCode::parse(raw).map_err(|e| match e {
        CountryCodeError::Empty => AppError::Validation(e.to_string()),
        CountryCodeError::Malformed(_) => AppError::NotFound(format!("no region for country {raw}")),
    })
}
