//! Authentication endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, AppState};
use crate::auth::{AuthError, CurrentUser};
use crate::users::{User, UserResponse};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user: UserResponse,
}

fn token_pair(state: &AppState, user: &User) -> Result<AuthResponse, ApiError> {
    let access_token = state
        .auth
        .generate_access_token(&user.id, &user.email, &user.name)?;
    let refresh_token = state
        .auth
        .generate_refresh_token(&user.id, &user.email, &user.name)?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        token_type: "bearer",
        user: user.clone().into(),
    })
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let user = state
        .users
        .register(&req.email, &req.password, &req.name)
        .await
        .map_err(ApiError::from_anyhow)?;

    Ok((StatusCode::CREATED, Json(token_pair(&state, &user)?)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .users
        .verify_credentials(&req.email, &req.password)
        .await
        .map_err(ApiError::from_anyhow)?;

    Ok(Json(token_pair(&state, &user)?))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let claims = state.auth.validate_token(&req.refresh_token)?;
    if !claims.is_refresh() {
        return Err(AuthError::InvalidToken(
            "access token used where refresh token expected".to_string(),
        )
        .into());
    }

    let user = state
        .users
        .find_by_id(&claims.sub)
        .await
        .map_err(ApiError::from_anyhow)?
        .filter(|u| u.is_active)
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(token_pair(&state, &user)?))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(user.id())
        .await
        .map_err(ApiError::from_anyhow)?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(user.into()))
}
