//! Like API endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;

use super::{error, path_id, ApiResult, CreatedResponse, RequestId};
use crate::errors::AppError;
use crate::models::{CreateLikeRequest, Like};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct LikesResponse {
    pub likes: Vec<Like>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub like: Like,
}

/// GET /likes - List all likes.
pub async fn list_likes(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<LikesResponse>> {
    match state.repo.list_likes().await {
        Ok(likes) => Ok(Json(LikesResponse { likes })),
        Err(e) => error(e, &request_id),
    }
}

/// GET /likes/:id - Get a single like.
pub async fn get_like(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<LikeResponse>> {
    let id = path_id(path, &request_id)?;

    match state.repo.get_like(&id).await {
        Ok(like) => Ok(Json(LikeResponse { like })),
        Err(e) => error(e, &request_id),
    }
}

/// POST /likes - Create a like stamped with the current time.
pub async fn create_like(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<CreateLikeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return error(AppError::Validation(rejection.body_text()), &request_id);
        }
    };

    // Validate required fields
    if request.title.trim().is_empty() || request.url.trim().is_empty() {
        return error(
            AppError::Validation("title and url are required".to_string()),
            &request_id,
        );
    }

    match state.repo.create_like(&request).await {
        Ok(like) => Ok((StatusCode::CREATED, Json(CreatedResponse { id: like.id }))),
        Err(e) => error(e, &request_id),
    }
}

/// DELETE /likes/:id - Delete a like.
pub async fn delete_like(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = path_id(path, &request_id)?;

    match state.repo.delete_like(&id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => error(e, &request_id),
    }
}
