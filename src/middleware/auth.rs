use axum::{
    extract::{FromRef, FromRequestParts, Query},
    http::{header, request::Parts},
};
use serde::Deserialize;

use crate::{error::AppError, models::Session, platform::JwtSessionVerifier};

impl<S> FromRequestParts<S> for Session
where
    JwtSessionVerifier: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::AuthRequired)?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        JwtSessionVerifier::from_ref(state).verify_bearer(auth_str)
    }
}

#[derive(Debug, Deserialize)]
struct SocketAuth {
    access_token: Option<String>,
}

/// Session for a WebSocket upgrade.
///
/// Browsers cannot set headers on an upgrade request, so the access token may
/// also arrive as the `access_token` query parameter. The header wins when
/// both are present.
#[derive(Debug)]
pub struct SocketSession(pub Session);

impl<S> FromRequestParts<S> for SocketSession
where
    JwtSessionVerifier: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if parts.headers.contains_key(header::AUTHORIZATION) {
            return Session::from_request_parts(parts, state).await.map(Self);
        }

        let Query(auth) = Query::<SocketAuth>::try_from_uri(&parts.uri)
            .map_err(|_| AppError::BadRequest("Invalid query string".into()))?;
        let token = auth
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(AppError::AuthRequired)?;

        JwtSessionVerifier::from_ref(state).verify(&token).map(Self)
    }
}
