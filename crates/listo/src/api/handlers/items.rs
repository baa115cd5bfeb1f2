//! Item endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::{ApiError, AppState};
use crate::auth::CurrentUser;
use crate::items::{Item, ItemCreate, ItemUpdate};
use crate::ws::ListEvent;

/// GET /api/v1/lists/{list_id}/items
pub async fn list_items(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(list_id): Path<String>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let items = state
        .items
        .list_items(user.id(), &list_id)
        .await
        .map_err(ApiError::from_anyhow)?;

    Ok(Json(items))
}

/// POST /api/v1/lists/{list_id}/items
pub async fn create_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(list_id): Path<String>,
    Json(req): Json<ItemCreate>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let item = state
        .items
        .create_item(user.id(), &list_id, req)
        .await
        .map_err(ApiError::from_anyhow)?;

    state.hub.broadcast(
        &list_id,
        &ListEvent::ItemAdded {
            list_id: list_id.clone(),
            item: item.clone(),
        },
    );

    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /api/v1/lists/{list_id}/items/{item_id}
pub async fn update_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((list_id, item_id)): Path<(String, String)>,
    Json(req): Json<ItemUpdate>,
) -> Result<Json<Item>, ApiError> {
    let item = state
        .items
        .update_item(user.id(), &list_id, &item_id, req)
        .await
        .map_err(ApiError::from_anyhow)?;

    state.hub.broadcast(
        &list_id,
        &ListEvent::ItemUpdated {
            list_id: list_id.clone(),
            item: item.clone(),
        },
    );

    Ok(Json(item))
}

/// POST /api/v1/lists/{list_id}/items/{item_id}/toggle
pub async fn toggle_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((list_id, item_id)): Path<(String, String)>,
) -> Result<Json<Item>, ApiError> {
    let item = state
        .items
        .toggle_item(user.id(), &list_id, &item_id)
        .await
        .map_err(ApiError::from_anyhow)?;

    state.hub.broadcast(
        &list_id,
        &ListEvent::ItemUpdated {
            list_id: list_id.clone(),
            item: item.clone(),
        },
    );

    Ok(Json(item))
}

/// DELETE /api/v1/lists/{list_id}/items/{item_id}
pub async fn delete_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((list_id, item_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let item = state
        .items
        .delete_item(user.id(), &list_id, &item_id)
        .await
        .map_err(ApiError::from_anyhow)?;

    state.hub.broadcast(
        &list_id,
        &ListEvent::ItemDeleted {
            list_id: list_id.clone(),
            item_id: item.id,
        },
    );

    Ok(StatusCode::NO_CONTENT)
}
