use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::api::{UserCreateRequest, UserResponse};
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::UserService;

/// POST /api/user
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<UserCreateRequest>, JsonRejection>,
) -> ApiResult<UserResponse> {
    let Json(request) = payload?;
    let user = UserService::new(state.db()).create(&request.username, &request.email).await?;
    Ok(ApiResponse::success(user.into()))
}
