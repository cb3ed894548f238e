//! Account handlers: register, login and profile update.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Serialize;

use jobtrack_models::{NewUser, ProfileUpdate};

use crate::auth::WritableUser;
use crate::error::{ApiError, ApiResult};
use crate::services::{LoginRequest, UserSummary};
use crate::state::AppState;

/// `{"user": {...}}`
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserSummary,
}

/// Register a new account.
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<NewUser>, ApiError>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state.accounts.register(body).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.accounts.login(body).await?;
    Ok(Json(UserResponse { user }))
}

/// Replace the caller's profile and issue a new token.
pub async fn update_user(
    State(state): State<AppState>,
    WritableUser(caller): WritableUser,
    WithRejection(Json(body), _): WithRejection<Json<ProfileUpdate>, ApiError>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.accounts.update_profile(&caller.user_id, body).await?;
    Ok(Json(UserResponse { user }))
}
