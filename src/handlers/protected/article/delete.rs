use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Extension;
use uuid::Uuid;

use crate::database::models::ArticleId;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;
use crate::services::ArticleService;

/// DELETE /api/article/:id - owner only; the row is soft-deleted
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    ArticleService::new(state.db()).delete(ArticleId::from(id), user.user_id).await?;
    Ok(ApiResponse::no_content())
}
