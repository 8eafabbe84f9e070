//! Hash list API endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};

use super::{error, ApiResult, RequestId};
use crate::errors::AppError;
use crate::models::HashList;
use crate::AppState;

/// GET /hashes - Get the hash list.
pub async fn get_hashes(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<HashList>> {
    match state.repo.get_hash_list().await {
        Ok(list) => Ok(Json(list)),
        Err(e) => error(e, &request_id),
    }
}

/// POST /hashes - Overwrite the hash list.
pub async fn update_hashes(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<HashList>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let list = match payload {
        Ok(Json(list)) => list,
        Err(rejection) => {
            return error(AppError::Validation(rejection.body_text()), &request_id);
        }
    };

    match state.repo.update_hash_list(&list).await {
        Ok(_) => Ok(StatusCode::OK),
        Err(e) => error(e, &request_id),
    }
}
