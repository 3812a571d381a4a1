//! Cart route handlers.
//!
//! The cart id comes from the `cart-id` cookie via [`SessionCookieStore`];
//! any write to that cookie is returned as part of the response.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tidewater_core::{Cart, Region};
use tracing::instrument;

use super::country_or_invalid;
use crate::error::{AppError, Result};
use crate::middleware::{ConsentGate, SessionCookieStore};
use crate::services::{CartError, CartOutcome};
use crate::state::AppState;

/// Country selection, as query string or JSON body.
#[derive(Debug, Deserialize)]
pub struct CartRequest {
    pub country_code: Option<String>,
}

/// Lookup-or-create response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub cart: Cart,
    pub region: Region,
    pub created: bool,
    /// The cart exists but its reference was not persisted.
    pub cookie_consent_required: bool,
}

impl From<CartOutcome> for CartResponse {
    fn from(outcome: CartOutcome) -> Self {
        Self {
            cart: outcome.cart,
            region: outcome.region,
            created: outcome.created,
            cookie_consent_required: outcome.cookie_consent_required,
        }
    }
}

/// Update response.
#[derive(Debug, Serialize)]
pub struct UpdatedCart {
    pub cart: Cart,
}

async fn get_or_create(
    state: &AppState,
    raw_country: Option<&str>,
    mut session: SessionCookieStore,
    consent: &ConsentGate,
) -> Result<(SessionCookieStore, Json<CartResponse>)> {
    let country = country_or_invalid(raw_country)?;
    let outcome = state
        .carts()
        .get_or_create(&country, &mut session, consent)
        .await?;
    Ok((session, Json(outcome.into())))
}

/// `GET /api/cart?country_code=..`
#[instrument(skip(state, session, consent))]
pub async fn show(
    State(state): State<AppState>,
    consent: ConsentGate,
    session: SessionCookieStore,
    Query(request): Query<CartRequest>,
) -> Result<(SessionCookieStore, Json<CartResponse>)> {
    get_or_create(&state, request.country_code.as_deref(), session, &consent).await
}

/// `POST /api/cart` with `{"country_code": ".."}`.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    consent: ConsentGate,
    session: SessionCookieStore,
    body: std::result::Result<Json<CartRequest>, JsonRejection>,
) -> Result<(SessionCookieStore, Json<CartResponse>)> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    get_or_create(&state, request.country_code.as_deref(), session, &consent).await
}

/// `PATCH /api/cart` with a partial field set. Fields outside the
/// allow-list are ignored.
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    session: SessionCookieStore,
    body: std::result::Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<UpdatedCart>> {
    let Json(fields) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let cart_id = session.get().ok_or(CartError::NoCartFound)?;

    let cart = state.carts().update(cart_id, &fields).await?;
    Ok(Json(UpdatedCart { cart }))
}
