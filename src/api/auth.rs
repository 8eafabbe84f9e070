//! Credential exchange endpoint.

use axum::{extract::State, http::HeaderMap, Extension, Json};
use serde::{Deserialize, Serialize};

use super::{error, ApiResult, RequestId};
use crate::auth::{authorization_header, issue_token, parse_basic_credentials, AuthError};
use crate::AppState;

/// Body of a successful credential exchange.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /auth - Exchange Basic credentials for a signed token.
pub async fn issue_auth_token(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> ApiResult<Json<TokenResponse>> {
    let credentials = match authorization_header(&headers).and_then(parse_basic_credentials) {
        Ok(credentials) => credentials,
        Err(e) => return error(e, &request_id),
    };

    if !credentials.matches(&state.config.api_username, &state.config.api_password) {
        return error(AuthError::InvalidCredentials, &request_id);
    }

    match issue_token(&state.config.token_secret) {
        Ok(token) => Ok(Json(TokenResponse { token })),
        Err(e) => error(e, &request_id),
    }
}
