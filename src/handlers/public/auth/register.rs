// handlers/public/auth/register.rs - POST /api/auth/register

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::api::RegisterRequest;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// Start a registration: store a pending code and mail it to the address
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<String> {
    let Json(request) = payload?;
    let code = super::auth_service(&state).register(&request.email).await?;

    state.mailer.send_registration_confirmation(&request.email, &code).await?;

    Ok(ApiResponse::success(format!("Confirmation email sent to {}", request.email)))
}
