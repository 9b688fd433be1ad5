use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::api::{UserResponse, UserUpdateRequest};
use crate::database::models::UserId;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;
use crate::services::UserService;

/// PUT /api/user/:id - only the user themselves may rename
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UserUpdateRequest>, JsonRejection>,
) -> ApiResult<UserResponse> {
    let Path(id) = id?;
    let Json(request) = payload?;

    let updated = UserService::new(state.db())
        .update(UserId::from(id), &request.username, user.user_id)
        .await?;
    Ok(ApiResponse::success(updated.into()))
}
