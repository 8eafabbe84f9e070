//! Post API endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{error, path_id, ApiResult, CreatedResponse, RequestId};
use crate::errors::AppError;
use crate::filter::{parse_flag, PostFilter};
use crate::models::Post;
use crate::AppState;

/// Post list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PostsQuery {
    /// "true" for posts visible now, "false" for drafts and scheduled posts.
    pub published: Option<String>,
    /// "true" or "false" to match the `listed` flag.
    pub listed: Option<String>,
}

impl PostsQuery {
    fn into_filter(self) -> Result<PostFilter, AppError> {
        let flag = |name: &str, raw: Option<String>| match raw {
            None => Ok(None),
            Some(raw) => parse_flag(&raw).map(Some).ok_or_else(|| {
                AppError::Validation(format!("invalid '{}' value '{}'", name, raw))
            }),
        };
        Ok(PostFilter::new(
            flag("listed", self.listed)?,
            flag("published", self.published)?,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: Post,
}

/// GET /posts - List posts, newest first, optionally filtered.
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<PostsQuery>, QueryRejection>,
) -> ApiResult<Json<PostsResponse>> {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            return error(AppError::Validation(rejection.body_text()), &request_id);
        }
    };
    let filter = match query.into_filter() {
        Ok(filter) => filter,
        Err(e) => return error(e, &request_id),
    };

    match state.repo.list_posts(filter, Utc::now()).await {
        Ok(posts) => Ok(Json(PostsResponse { posts })),
        Err(e) => error(e, &request_id),
    }
}

/// GET /posts/:id - Get a single post.
pub async fn get_post(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<PostResponse>> {
    let id = path_id(path, &request_id)?;

    match state.repo.get_post(&id).await {
        Ok(post) => Ok(Json(PostResponse { post })),
        Err(e) => error(e, &request_id),
    }
}

/// POST /posts - Create a new post.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<Post>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let post = match payload {
        Ok(Json(post)) => post,
        Err(rejection) => {
            return error(AppError::Validation(rejection.body_text()), &request_id);
        }
    };

    // Validate required fields
    if post.title.trim().is_empty() || post.slug.trim().is_empty() {
        return error(
            AppError::Validation("title and slug are required".to_string()),
            &request_id,
        );
    }

    match state.repo.create_post(&post).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(CreatedResponse { id: created.id }))),
        Err(e) => error(e, &request_id),
    }
}

/// POST/PUT /posts/:id - Replace a post.
pub async fn update_post(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<Post>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let id = path_id(path, &request_id)?;

    let post = match payload {
        Ok(Json(post)) => post,
        Err(rejection) => {
            return error(AppError::Validation(rejection.body_text()), &request_id);
        }
    };

    match state.repo.update_post(&id, &post).await {
        Ok(_) => Ok(StatusCode::OK),
        Err(e) => error(e, &request_id),
    }
}

/// DELETE /posts/:id - Delete a post.
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = path_id(path, &request_id)?;

    match state.repo.delete_post(&id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => error(e, &request_id),
    }
}
