//! Error handling module for the web API.
//!
//! Maps failures onto three client-visible classes (401, 400, 500). The
//! client only ever sees a generic message; details go to the log, tagged
//! with the request id.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::auth::{AuthError, TokenError};
use crate::build::BuildError;
use crate::store::StoreError;

/// Client-facing messages.
pub mod messages {
    pub const UNAUTHORIZED: &str = "Unauthorized";
    pub const BAD_REQUEST: &str = "Bad request";
    pub const INTERNAL_ERROR: &str = "Internal server error";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Bad or missing credentials, bad or expired token
    Unauthorized(AuthError),
    /// Missing path parameter, malformed body or query
    Validation(String),
    /// Any document store failure
    Backend(StoreError),
    /// Server-side fault outside the store (e.g. token signing)
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the message shown to the client.
    pub fn message(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => messages::UNAUTHORIZED,
            AppError::Validation(_) => messages::BAD_REQUEST,
            AppError::Backend(_) | AppError::Internal(_) => messages::INTERNAL_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Unauthorized(err) => write!(f, "unauthorized: {}", err),
            AppError::Validation(msg) => write!(f, "validation failed: {}", msg),
            AppError::Backend(err) => write!(f, "{}", err),
            AppError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Unauthorized(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Backend(err)
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Internal(format!("failed to sign token; {}", err))
    }
}

impl From<BuildError> for AppError {
    fn from(err: BuildError) -> Self {
        AppError::Internal(format!("failed to trigger build; {}", err))
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub timestamp: String,
    pub message: String,
    pub request_id: String,
}

impl ErrorResponse {
    pub fn new(error: &AppError, request_id: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            message: error.message().to_string(),
            request_id: request_id.to_string(),
        }
    }
}

/// Wrapper type for errors that carry the request id.
#[derive(Debug)]
pub struct AppErrorWithRequestId {
    pub error: AppError,
    pub request_id: String,
}

impl AppErrorWithRequestId {
    pub fn new(error: impl Into<AppError>, request_id: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            request_id: request_id.into(),
        }
    }
}

impl IntoResponse for AppErrorWithRequestId {
    fn into_response(self) -> Response {
        let request_id = self.request_id.as_str();
        match &self.error {
            AppError::Unauthorized(_) | AppError::Validation(_) => {
                tracing::warn!(request_id, "{}", self.error)
            }
            AppError::Backend(_) | AppError::Internal(_) => {
                tracing::error!(request_id, "{}", self.error)
            }
        }

        let status = self.error.status_code();
        let body = ErrorResponse::new(&self.error, request_id);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::from(AuthError::MissingHeader).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Validation("id is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(StoreError::NotFound("web-likes/x".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(TokenError::EmptySecret).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(BuildError::NotConfigured).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_hide_details() {
        let err = AppError::from(
            StoreError::Status {
                status: 403,
                body: "permission denied on projects/secret".into(),
            }
            .context("failed to list posts"),
        );
        assert_eq!(err.message(), "Internal server error");
        assert!(err.to_string().contains("failed to list posts"));
    }

    #[test]
    fn test_error_response_shape() {
        let err = AppError::Validation("bad json".into());
        let body = serde_json::to_value(ErrorResponse::new(&err, "req-1")).unwrap();

        assert_eq!(body["message"], "Bad request");
        assert_eq!(body["requestId"], "req-1");
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert_eq!(body.as_object().unwrap().len(), 3);
    }
}
