//! Explicit get/set/clear of the cart reference, independent of cart
//! content. Used by client-side initialisation to decide whether a cart
//! must be created.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tidewater_core::CartId;

use crate::error::{AppError, Result};
use crate::middleware::{ConsentGate, SessionCookieStore, is_cookie_value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCartId {
    pub cart_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartIdResponse {
    pub cart_id: Option<CartId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCartIdResponse {
    pub cart_id: CartId,
    pub persisted: bool,
    pub cookie_consent_required: bool,
}

/// `GET /api/cart-id`
pub async fn show(session: SessionCookieStore) -> Json<CartIdResponse> {
    Json(CartIdResponse {
        cart_id: session.get().cloned(),
    })
}

/// `POST /api/cart-id` with `{"cartId": ".."}`. Written only with consent.
pub async fn set(
    consent: ConsentGate,
    mut session: SessionCookieStore,
    body: std::result::Result<Json<SetCartId>, JsonRejection>,
) -> Result<(SessionCookieStore, Json<SetCartIdResponse>)> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let raw = request.cart_id.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("cartId cannot be empty".to_string()));
    }
    if !is_cookie_value(raw) {
        return Err(AppError::Validation(
            "cartId may only contain visible ASCII other than quotes, commas, semicolons and backslashes"
                .to_string(),
        ));
    }

    let cart_id = CartId::new(raw);
    let persisted = session.set(&cart_id, &consent);

    Ok((
        session,
        Json(SetCartIdResponse {
            cart_id,
            persisted,
            cookie_consent_required: !persisted,
        }),
    ))
}

/// `DELETE /api/cart-id`
pub async fn clear(mut session: SessionCookieStore) -> (SessionCookieStore, StatusCode) {
    session.clear();
    (session, StatusCode::NO_CONTENT)
}
