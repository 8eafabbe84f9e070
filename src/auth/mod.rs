//! Token-based authentication.
//!
//! Clients exchange Basic credentials for a short-lived signed token at
//! `POST /auth` and present it as `Authorization: Bearer <token>` on every
//! other call. [`jwt_auth_layer`] guards every protected route.

mod basic;
mod token;

pub use basic::*;
pub use token::*;

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::RequestId;
use crate::errors::AppErrorWithRequestId;

/// Reasons a request is not authenticated. Never shown to clients.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing 'Authorization' header")]
    MissingHeader,
    #[error("failed to parse two parts of 'Authorization' header")]
    MalformedHeader,
    #[error("unexpected authorization scheme '{0}'")]
    WrongScheme(String),
    #[error("failed to decode encoded username/password")]
    InvalidBase64,
    #[error("failed to parse colon-separated username/password")]
    MalformedCredentials,
    #[error("invalid credentials provided")]
    InvalidCredentials,
    #[error("token has expired")]
    ExpiredToken,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("cannot validate token without a secret")]
    SecretNotConfigured,
}

/// Split an `Authorization` value into exactly two space-separated parts.
fn split_header(header: &str) -> Result<(&str, &str), AuthError> {
    if header.is_empty() {
        return Err(AuthError::MissingHeader);
    }
    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        [scheme, value] => Ok((*scheme, *value)),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Read the `Authorization` header.
pub fn authorization_header(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)
}

/// Token validation layer; takes the signing secret as a parameter.
pub async fn jwt_auth_layer(token_secret: Arc<str>, request: Request, next: Next) -> Response {
    let checked = authorization_header(request.headers())
        .and_then(parse_bearer)
        .and_then(|token| validate_token(&token_secret, token));

    match checked {
        Ok(_) => next.run(request).await,
        Err(err) => {
            let request_id = RequestId::of(&request);
            AppErrorWithRequestId::new(err, request_id).into_response()
        }
    }
}
