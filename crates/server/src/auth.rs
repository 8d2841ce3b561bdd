//! Bearer-token authentication extractor.
//!
//! Handlers that take an [`AuthUser`] argument only run for requests whose
//! `Authorization: Bearer ...` token the identity provider accepts; every
//! other request is answered with 401 before the handler body executes.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use deploy::AuthenticatedUser;

use crate::error::ApiError;
use crate::state::AppState;

/// The verified caller of the current request.
pub struct AuthUser(pub AuthenticatedUser);

/// Pulls the token out of an `Authorization: Bearer ...` header value.
fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ApiError::MissingAuth)?;

        let user = state.identity.verify_token(token).await?;
        debug!(user = %user.id, "request authenticated");
        Ok(Self(user))
    }
}
