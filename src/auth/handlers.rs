use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::{
    dto::TokenResponse,
    extractors::X_TOKEN,
    repo::User,
    services::{basic_credentials, verify_password},
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/connect", get(connect))
        .route("/disconnect", get(disconnect))
}

/// GET /connect: exchange Basic credentials for a session token.
#[instrument(skip(state, headers))]
pub async fn connect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<TokenResponse>> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    let (email, password) = basic_credentials(auth_header).ok_or(ApiError::Unauthorized)?;

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| {
            warn!(%email, "connect unknown email");
            ApiError::Unauthorized
        })?;

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "connect invalid password");
        return Err(ApiError::Unauthorized);
    }

    let token = state
        .sessions
        .issue(user.id, state.config.session_ttl)
        .await?;
    info!(user_id = %user.id, "session issued");
    Ok(Json(TokenResponse { token }))
}

/// GET /disconnect: revoke the presented session token.
#[instrument(skip(state, headers))]
pub async fn disconnect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let token = headers
        .get(X_TOKEN)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let user_id = state
        .sessions
        .resolve(token)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    state.sessions.revoke(token).await?;
    info!(%user_id, "session revoked");
    Ok(StatusCode::NO_CONTENT)
}
