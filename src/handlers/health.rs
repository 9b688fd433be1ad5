// handlers/health.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::server::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Bloqqer API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth/login, /api/auth/register, /api/auth/register/confirm (public)",
            "user": "/api/user[/me|/id/:id|/email/:email|/:id] (protected)",
            "article": "/api/article[/:id|/user/:userId/all] (protected)",
            "health": "/health (public)"
        }
    }))
}

/// GET /health - storage liveness
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let storage = state.storage.name();

    match state.storage.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "storage": storage
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed for {} storage: {}", storage, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "storage": storage
                })),
            )
        }
    }
}
