use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use crate::api::{ArticleCreateRequest, ArticleResponse};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;
use crate::services::ArticleService;

/// POST /api/article - the caller becomes the owner
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ArticleCreateRequest>, JsonRejection>,
) -> ApiResult<ArticleResponse> {
    let Json(request) = payload?;
    let article = ArticleService::new(state.db()).create(&request.content, user.user_id).await?;
    Ok(ApiResponse::success(article.into()))
}
