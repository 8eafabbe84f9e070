//! Signed bearer tokens.
//!
//! Tokens are HS256 JWTs carrying only an expiry. Nothing is stored, so a
//! token stays valid until it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use super::{split_header, AuthError};

/// How long an issued token stays valid.
pub const TOKEN_VALIDITY_HOURS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Errors raised while signing. These are server faults.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token secret is not configured")]
    EmptySecret,
    #[error("failed to encode token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Issue a token valid for two hours from now.
pub fn issue_token(secret: &str) -> Result<String, TokenError> {
    issue_token_at(secret, Utc::now())
}

/// Issue a token valid for two hours from `issued_at`.
pub fn issue_token_at(secret: &str, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }
    let claims = Claims {
        exp: (issued_at + Duration::hours(TOKEN_VALIDITY_HOURS)).timestamp(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Extract the token from `Bearer <token>`.
pub fn parse_bearer(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = split_header(header)?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::WrongScheme(scheme.to_string()));
    }
    Ok(token)
}

/// Verify signature and expiry. No clock leeway is applied.
pub fn validate_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::SecretNotConfigured);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken(e.to_string()),
    })
}
