use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::instrument;

use crate::auth::repo::User;
use crate::error::ApiResult;
use crate::files::repo::FileNode;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .route("/stats", get(stats))
}

/// GET /status: backend liveness. Always 200; the booleans carry the news.
#[instrument(skip(state))]
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let db = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();
    let redis = state.sessions.ping().await;
    Json(json!({ "redis": redis, "db": db }))
}

/// GET /stats: collection counts.
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let users = User::count(&state.db).await?;
    let files = FileNode::count(&state.db).await?;
    Ok(Json(json!({ "users": users, "files": files })))
}
