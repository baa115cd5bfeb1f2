//! List endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::api::{ApiError, AppState};
use crate::auth::CurrentUser;
use crate::lists::{ListCreate, ListResponse, ListUpdate, MemberAdd, MemberInfo, MemberRoleUpdate};
use crate::ws::{ListEvent, PresenceUser};

/// GET /api/v1/lists
pub async fn list_lists(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ListResponse>>, ApiError> {
    let lists = state
        .lists
        .lists_for_user(user.id())
        .await
        .map_err(ApiError::from_anyhow)?;

    Ok(Json(lists.into_iter().map(Into::into).collect()))
}

/// POST /api/v1/lists
pub async fn create_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ListCreate>,
) -> Result<(StatusCode, Json<ListResponse>), ApiError> {
    let list = state
        .lists
        .create_list(user.id(), req)
        .await
        .map_err(ApiError::from_anyhow)?;

    Ok((StatusCode::CREATED, Json(list.into())))
}

/// GET /api/v1/lists/{list_id}
pub async fn get_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(list_id): Path<String>,
) -> Result<Json<ListResponse>, ApiError> {
    let list = state
        .lists
        .get_list(user.id(), &list_id)
        .await
        .map_err(ApiError::from_anyhow)?;

    Ok(Json(list.into()))
}

/// PATCH /api/v1/lists/{list_id}
pub async fn update_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(list_id): Path<String>,
    Json(req): Json<ListUpdate>,
) -> Result<Json<ListResponse>, ApiError> {
    let list = state
        .lists
        .update_list(user.id(), &list_id, req)
        .await
        .map_err(ApiError::from_anyhow)?;

    let response = ListResponse::from(list);
    state.hub.broadcast(
        &list_id,
        &ListEvent::ListUpdated {
            list_id: list_id.clone(),
            list: response.clone(),
        },
    );

    Ok(Json(response))
}

/// DELETE /api/v1/lists/{list_id}
pub async fn delete_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(list_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .lists
        .delete_list(user.id(), &list_id)
        .await
        .map_err(ApiError::from_anyhow)?;

    state.hub.broadcast(
        &list_id,
        &ListEvent::ListDeleted {
            list_id: list_id.clone(),
        },
    );

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/lists/{list_id}/members
pub async fn add_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(list_id): Path<String>,
    Json(req): Json<MemberAdd>,
) -> Result<(StatusCode, Json<MemberInfo>), ApiError> {
    let member = state
        .lists
        .add_member(user.id(), &list_id, req)
        .await
        .map_err(ApiError::from_anyhow)?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// GET /api/v1/lists/{list_id}/members
pub async fn list_members(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(list_id): Path<String>,
) -> Result<Json<Vec<MemberInfo>>, ApiError> {
    let members = state
        .lists
        .list_members(user.id(), &list_id)
        .await
        .map_err(ApiError::from_anyhow)?;

    Ok(Json(members))
}

/// PATCH /api/v1/lists/{list_id}/members/{member_id}
pub async fn update_member_role(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((list_id, member_id)): Path<(String, String)>,
    Json(req): Json<MemberRoleUpdate>,
) -> Result<Json<MemberInfo>, ApiError> {
    let member = state
        .lists
        .update_member_role(user.id(), &list_id, &member_id, req.role)
        .await
        .map_err(ApiError::from_anyhow)?;

    Ok(Json(member))
}

/// DELETE /api/v1/lists/{list_id}/members/{member_id}
pub async fn remove_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((list_id, member_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .lists
        .remove_member(user.id(), &list_id, &member_id)
        .await
        .map_err(ApiError::from_anyhow)?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub list_id: String,
    pub users: Vec<PresenceUser>,
}

/// GET /api/v1/lists/{list_id}/presence
pub async fn list_presence(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(list_id): Path<String>,
) -> Result<Json<PresenceResponse>, ApiError> {
    // Membership check only; presence itself lives in the hub.
    state
        .lists
        .require_role(user.id(), &list_id)
        .await
        .map_err(ApiError::from_anyhow)?;

    Ok(Json(PresenceResponse {
        users: state.hub.active_users(&list_id),
        list_id,
    }))
}
