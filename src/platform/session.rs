use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, models::Session};

/// Audience the platform stamps on tokens of signed-in users.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

#[derive(Debug, Deserialize, Serialize)]
pub struct AccessClaims {
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
}

/// Turns platform access tokens into [`Session`]s.
#[derive(Clone)]
pub struct JwtSessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtSessionVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Session, AppError> {
        let decoded = decode::<AccessClaims>(token, &self.key, &self.validation).map_err(|err| {
            tracing::debug!(error = %err, "rejected access token");
            AppError::AuthRequired
        })?;

        let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::AuthRequired)?;

        Ok(Session {
            user_id,
            email: decoded.claims.email,
            access_token: token.to_string(),
        })
    }

    /// Accepts the raw `Authorization` header value.
    pub fn verify_bearer(&self, header: &str) -> Result<Session, AppError> {
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::AuthRequired)?;
        self.verify(token)
    }
}
