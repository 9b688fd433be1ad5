use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use crate::api::{ArticleResponse, IncludeDeletedQuery};
use crate::database::models::UserId;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::ArticleService;

/// GET /api/article/user/:user_id/all - oldest first
pub async fn list_by_owner(
    State(state): State<AppState>,
    user_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<IncludeDeletedQuery>, QueryRejection>,
) -> ApiResult<Vec<ArticleResponse>> {
    let Path(user_id) = user_id?;
    let Query(query) = query?;

    let articles = ArticleService::new(state.db())
        .get_all_by_owner(UserId::from(user_id), query.include_deleted)
        .await?;
    Ok(ApiResponse::success(articles.into_iter().map(ArticleResponse::from).collect()))
}
