use axum::{extract::State, Extension};

use crate::api::UserResponse;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;
use crate::services::UserService;

/// GET /api/user/me - the user named by the token's `userid` claim
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<UserResponse> {
    let user = UserService::new(state.db()).get_by_id(user.user_id).await?;
    Ok(ApiResponse::success(user.into()))
}
