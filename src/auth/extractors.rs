use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::debug;

use super::{
    claims::TokenKind,
    dto::JwtKeys,
    session::Session,
};
use crate::{error::AppError, state::AppState};

fn bearer_token(parts: &Parts) -> Option<&str> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
}

/// Resolves the Session Context from `Authorization: Bearer <access token>`.
/// Anything missing, expired, revoked or of the wrong kind sends the client
/// to the login page.
#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthenticated)?;

        let claims = JwtKeys::from_ref(state).verify(token).map_err(|e| {
            debug!(error = %e, "invalid or expired token");
            AppError::Unauthenticated
        })?;

        if claims.kind != TokenKind::Access {
            return Err(AppError::Unauthenticated);
        }
        if state.sessions.is_revoked(&claims.sid) {
            debug!(user_id = claims.sub, "token from a terminated session");
            return Err(AppError::Unauthenticated);
        }

        Ok(Session::from(claims))
    }
}
