use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use crate::api::{ArticleResponse, IncludeDeletedQuery};
use crate::database::models::ArticleId;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::ArticleService;

/// GET /api/article/:id - soft-deleted articles only with `?includeDeleted=true`
pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<IncludeDeletedQuery>, QueryRejection>,
) -> ApiResult<ArticleResponse> {
    let Path(id) = id?;
    let Query(query) = query?;

    let article = ArticleService::new(state.db())
        .get_by_id(ArticleId::from(id), query.include_deleted)
        .await?;
    Ok(ApiResponse::success(article.into()))
}
