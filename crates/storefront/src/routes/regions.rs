//! Region lookup route.

use axum::{
    Json,
    extract::{Path, State},
};
use tidewater_core::Region;
use tracing::instrument;

use super::country_or_not_found;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Region serving a country, or 404.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(country_code): Path<String>,
) -> Result<Json<Region>> {
    let country = country_or_not_found(&country_code)?;

    let region = state
        .regions()
        .resolve(&country)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no region for country {country}")))?;

    Ok(Json(region))
}
