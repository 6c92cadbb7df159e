use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the session token.
pub const X_TOKEN: &str = "x-token";

/// Resolves the `X-Token` header to a user id, rejecting with 401 when the
/// header is missing or the token is expired, revoked, or unknown.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(X_TOKEN)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let user_id = state
            .sessions
            .resolve(token)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser(user_id))
    }
}

/// Like [`AuthUser`] but anonymous-tolerant: a missing or unresolvable token
/// yields `None` instead of rejecting. Used where public content must stay
/// reachable without credentials.
pub struct MaybeAuthUser(pub Option<Uuid>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = parts.headers.get(X_TOKEN).and_then(|h| h.to_str().ok()) else {
            return Ok(MaybeAuthUser(None));
        };

        let user_id = match state.sessions.resolve(token).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(error = %e, "session lookup failed, treating request as anonymous");
                None
            }
        };

        Ok(MaybeAuthUser(user_id))
    }
}
