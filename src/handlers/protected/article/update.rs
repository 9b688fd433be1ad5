use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::api::{ArticleResponse, ArticleUpdateRequest};
use crate::database::models::ArticleId;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;
use crate::services::ArticleService;

/// PUT /api/article/:id - owner only
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ArticleUpdateRequest>, JsonRejection>,
) -> ApiResult<ArticleResponse> {
    let Path(id) = id?;
    let Json(request) = payload?;

    let article = ArticleService::new(state.db())
        .update(ArticleId::from(id), &request.content, user.user_id)
        .await?;
    Ok(ApiResponse::success(article.into()))
}
