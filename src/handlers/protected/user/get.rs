use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::api::UserResponse;
use crate::database::models::UserId;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::UserService;

/// GET /api/user/id/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<UserResponse> {
    let Path(id) = id?;
    let user = UserService::new(state.db()).get_by_id(UserId::from(id)).await?;
    Ok(ApiResponse::success(user.into()))
}

/// GET /api/user/email/:email
pub async fn get_by_email(
    State(state): State<AppState>,
    email: Result<Path<String>, PathRejection>,
) -> ApiResult<UserResponse> {
    let Path(email) = email?;
    let user = UserService::new(state.db()).get_by_email(&email).await?;
    Ok(ApiResponse::success(user.into()))
}
