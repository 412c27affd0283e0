//! Axum route handlers for the attribution API.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::attribution::engine::{compute_attribution, DEFAULT_WINDOW_HOURS};
use crate::attribution::store;
use crate::errors::AppError;
use crate::models::attribution::AttributionResultRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ComputeParams {
    pub window_hours: Option<i64>,
}

/// POST /api/v1/campaigns/:campaign_id/attribution/compute
///
/// Runs one scoring pass over the campaign's unattributed conversions,
/// appends the result to its history, and returns the persisted record.
pub async fn handle_compute(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
    Query(params): Query<ComputeParams>,
) -> Result<Json<AttributionResultRow>, AppError> {
    let window_hours = params.window_hours.unwrap_or(DEFAULT_WINDOW_HOURS);
    if window_hours < 1 {
        return Err(AppError::Validation(
            "window_hours must be at least 1".to_string(),
        ));
    }

    let result =
        compute_attribution(&state.db, &state.notifier, &campaign_id, window_hours).await?;
    Ok(Json(result))
}

/// GET /api/v1/campaigns/:campaign_id/attribution
///
/// Append-only result history, newest first. A campaign with no computed
/// results yields an empty list, not a 404.
pub async fn handle_history(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
) -> Result<Json<Vec<AttributionResultRow>>, AppError> {
    let results = store::list_results(&state.db, &campaign_id)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(results))
}
