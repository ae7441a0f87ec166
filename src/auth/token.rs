use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::models::AccessTokenClaims;
use crate::utils::{AppError, internal_error, types::AppState};

const BEARER: &str = "Bearer ";

pub fn issue_token(user_id: i32, secret: &str, ttl_secs: i64) -> Result<String, AppError> {
    let exp = chrono::Utc::now().timestamp().saturating_add(ttl_secs).max(0) as u64;
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(internal_error)
}

pub fn decode_token(token: &str, secret: &str) -> Result<AccessTokenClaims, AppError> {
    decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        AppError::Unauthenticated("Invalid token.".to_owned())
    })
}

impl AccessTokenClaims {
    pub fn user_id(&self) -> Result<i32, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthenticated("Invalid token.".to_owned()))
    }
}

impl FromRequestParts<AppState> for AccessTokenClaims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthenticated(
                    "Authentication credentials were not provided.".to_owned(),
                )
            })?;

        let token = header
            .strip_prefix(BEARER)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthenticated("Invalid token header.".to_owned()))?;

        decode_token(token, &state.config.jwt_secret)
    }
}
