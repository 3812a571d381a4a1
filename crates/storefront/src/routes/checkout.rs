//! Checkout composition route.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use super::country_or_not_found;
use crate::error::Result;
use crate::middleware::{ConsentGate, OptionalCustomerToken, SessionCookieStore};
use crate::services::CheckoutView;
use crate::state::AppState;

/// `GET /api/checkout/{country_code}`
#[instrument(skip(state, consent, session, token))]
pub async fn show(
    State(state): State<AppState>,
    consent: ConsentGate,
    mut session: SessionCookieStore,
    OptionalCustomerToken(token): OptionalCustomerToken,
    Path(country_code): Path<String>,
) -> Result<(SessionCookieStore, Json<CheckoutView>)> {
    let country = country_or_not_found(&country_code)?;

    let view = state
        .checkout()
        .compose(&country, &mut session, &consent, token)
        .await?;

    Ok((session, Json(view)))
}
