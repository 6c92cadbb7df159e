use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/files", post(handlers::upload).get(handlers::index))
        .route("/files/:id", get(handlers::show))
        .route("/files/:id/publish", put(handlers::publish))
        .route("/files/:id/unpublish", put(handlers::unpublish))
        .route("/files/:id/data", get(handlers::download))
}
