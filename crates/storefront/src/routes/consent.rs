//! Consent decision route.
//!
//! Declining is a full reset: every cookie the client sent is expired
//! (except the client's own consent record) and the client is told to wipe
//! its local storage.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, header::SET_COOKIE},
};
use serde::{Deserialize, Serialize};
use tidewater_core::{ConsentDecision, ConsentEffect};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::{CONSENT_COOKIE_NAME, ConsentGate, expired_cookie, request_cookies};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConsentRequest {
    pub decision: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentResponse {
    pub previous: ConsentDecision,
    pub decision: ConsentDecision,
    /// The client must clear all of its local storage.
    pub clear_local_storage: bool,
    /// Names of the cookies expired by this response.
    pub cleared_cookies: Vec<String>,
}

/// `POST /api/consent` with `{"decision": "accepted"|"declined"}`.
#[instrument(skip_all, fields(previous = %gate.decision()))]
pub async fn decide(
    State(state): State<AppState>,
    gate: ConsentGate,
    request_headers: HeaderMap,
    body: std::result::Result<Json<ConsentRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<ConsentResponse>)> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let next: ConsentDecision = request
        .decision
        .parse()
        .map_err(|e: tidewater_core::ConsentError| AppError::Validation(e.to_string()))?;
    let effect = gate
        .decision()
        .transition(next)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut headers = HeaderMap::new();
    let mut cleared_cookies = Vec::new();

    if effect == ConsentEffect::ClearAll {
        let secure = state.config().is_secure();
        for cookie in request_cookies(&request_headers) {
            if cookie.name() == CONSENT_COOKIE_NAME || cleared_cookies.iter().any(|n| n == cookie.name()) {
                continue;
            }
            let name = cookie.name().to_owned();
            match HeaderValue::from_str(&expired_cookie(name.clone(), secure).to_string()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                    cleared_cookies.push(name);
                }
                Err(e) => tracing::warn!(cookie = %name, error = %e, "cannot expire cookie"),
            }
        }
        tracing::info!(cleared = cleared_cookies.len(), "consent declined, clearing client state");
    }

    Ok((
        headers,
        Json(ConsentResponse {
            previous: gate.decision(),
            decision: next,
            clear_local_storage: effect == ConsentEffect::ClearAll,
            cleared_cookies,
        }),
    ))
}
