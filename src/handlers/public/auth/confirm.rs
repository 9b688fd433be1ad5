// handlers/public/auth/confirm.rs - POST /api/auth/register/confirm

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::api::{RegistrationConfirmationRequest, RegistrationConfirmationResponse};
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

pub async fn confirm(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationConfirmationRequest>, JsonRejection>,
) -> ApiResult<RegistrationConfirmationResponse> {
    let Json(request) = payload?;
    let user = super::auth_service(&state)
        .confirm_registration(&request.confirmation_code, &request.username, &request.password)
        .await?;
    Ok(ApiResponse::success(user.into()))
}
