use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;
use uuid::Uuid;

use super::tokens::parse_authorization;
use crate::{error::ApiError, state::AppState};

/// Resolves the request's token to the acting user's id.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                ApiError::unauthorized("Authentication credentials were not provided")
            })?;

        let key = parse_authorization(header)
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header"))?;

        match state.store.resolve_token(key).await? {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => {
                warn!("unknown token");
                Err(ApiError::unauthorized("Invalid token"))
            }
        }
    }
}
