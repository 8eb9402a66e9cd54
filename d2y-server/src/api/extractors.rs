//! Custom Axum extractors for request authentication.
//!
//! Provides `Authenticated`, which resolves the `Authorization: Bearer`
//! credential to a [`Caller`] through the configured identity resolver.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use d2y_core::identity::{Caller, IdentityResolver};

use super::ApiError;
use crate::state::AppState;

/// The caller behind the request's bearer credential.
pub struct Authenticated(pub Caller);

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Resolve a raw credential, failing with `Unauthorized`.
pub async fn resolve_caller(state: &AppState, token: Option<&str>) -> Result<Caller, ApiError> {
    let token = token.ok_or(ApiError::Unauthorized)?;
    state
        .identities
        .resolve(token)
        .await
        .ok_or(ApiError::Unauthorized)
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = resolve_caller(state, bearer_token(&parts.headers)).await?;
        Ok(Authenticated(caller))
    }
}
