//! Authentication extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use ticketgate_access::{AuthError, Principal};

use super::AppState;
use crate::error::ApiError;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session_token";

/// Extractor for requiring an authenticated user.
///
/// Reads the session cookie, verifies the token and loads the user it
/// names. Any failure is rejected with the generic authentication error.
pub struct RequireUser(pub Principal);

impl<S> FromRequestParts<S> for RequireUser
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::BadRequest {
                reason: "unreadable cookies".to_string(),
            })?;

        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::Auth(AuthError::MissingToken.into()))?;

        let principal = app_state.authenticator.resolve_session(&token).await?;
        Ok(RequireUser(principal))
    }
}
