use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::claims::Claims;
use crate::{
    error::{ApiError, AuthError},
    state::AppState,
};

/// Validates the bearer access token and yields its claims.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = || AuthError::Unauthorized.localize(state.config.locale);

        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(unauthorized)?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(unauthorized)?;

        let claims = state
            .accounts
            .tokens()
            .validate_access_token(token)
            .ok_or_else(unauthorized)?;

        Ok(AuthUser(claims))
    }
}
