//! Offline sync endpoint.

use axum::{Json, extract::State};

use crate::api::{ApiError, AppState};
use crate::auth::CurrentUser;
use crate::sync::{SyncRequest, SyncResponse};

/// POST /api/v1/sync/batch
pub async fn sync_batch(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, ApiError> {
    let response = state
        .reconciler
        .process_batch(user.id(), req)
        .await
        .map_err(ApiError::from_anyhow)?;

    Ok(Json(response))
}
