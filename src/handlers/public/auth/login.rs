// handlers/public/auth/login.rs - POST /api/auth/login

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::api::{LoginRequest, LoginResponse};
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// Exchange an email (and a password that is required but not checked) for
/// a signed JWT. Stamps `last_login_at`.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;
    let result = super::auth_service(&state).login(&request.email, &request.password).await?;
    Ok(ApiResponse::success(result.into()))
}
