use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use super::{jwt::JwtKeys, services};
use crate::error::AppError;

/// Header the web client sends its token in.
pub const TOKEN_HEADER: &str = "token";

/// Extracts and validates the session token, returning the user ID.
///
/// The token is read from the `token` header first and from
/// `Authorization: Bearer <token>` otherwise.
pub struct AuthUser(pub Uuid);

fn bearer_token(parts: &Parts) -> Option<&str> {
    if let Some(token) = parts.headers.get(TOKEN_HEADER).and_then(|h| h.to_str().ok()) {
        return Some(token.trim());
    }
    let auth = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).unwrap_or_default();
        let keys = JwtKeys::from_ref(state);
        services::verify(&keys, token).map(AuthUser)
    }
}
