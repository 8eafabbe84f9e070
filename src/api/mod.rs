//! REST API module.
//!
//! Contains all routes and handlers. Every handler except `POST /auth`
//! sits behind `auth::jwt_auth_layer`.

mod auth;
mod builds;
mod hashes;
mod likes;
mod posts;
mod request_id;

pub use auth::*;
pub use builds::*;
pub use hashes::*;
pub use likes::*;
pub use posts::*;
pub use request_id::*;

use axum::extract::{rejection::PathRejection, Path};
use serde::Serialize;

use crate::errors::{AppError, AppErrorWithRequestId};

/// Response type that is either the handler output or a tagged error.
pub type ApiResult<T> = Result<T, AppErrorWithRequestId>;

/// Create an error API response.
pub fn error<T>(err: impl Into<AppError>, request_id: &RequestId) -> ApiResult<T> {
    Err(request_id.error(err))
}

/// Extract the `{id}` path parameter, rejecting a blank one before any
/// store call.
fn path_id(path: Result<Path<String>, PathRejection>, request_id: &RequestId) -> ApiResult<String> {
    let id = match path {
        Ok(Path(id)) => id,
        Err(rejection) => {
            return error(AppError::Validation(rejection.body_text()), request_id);
        }
    };
    if id.trim().is_empty() {
        return error(AppError::Validation("id is required".to_string()), request_id);
    }
    Ok(id)
}

/// Body of `GET /hello`.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of create endpoints.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// GET /hello - Token check for clients.
pub async fn hello() -> axum::Json<MessageResponse> {
    axum::Json(MessageResponse {
        message: "hello".to_string(),
    })
}
