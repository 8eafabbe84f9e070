//! Site build and backup endpoints.

use axum::{extract::State, Extension, Json};

use super::{error, ApiResult, RequestId};
use crate::errors::AppError;
use crate::models::Backup;
use crate::AppState;

/// POST /builds - Trigger a site build; relays the build service's reply.
pub async fn trigger_build(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<serde_json::Value>> {
    match state.builds.trigger().await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => error(e, &request_id),
    }
}

/// POST /backups - Start a Firestore export to the backup bucket.
pub async fn create_backup(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<Backup>> {
    let bucket = &state.config.backup_bucket_name;
    if bucket.is_empty() {
        return error(
            AppError::Internal("backup bucket is not configured".to_string()),
            &request_id,
        );
    }

    match state.repo.create_backup(bucket).await {
        Ok(backup) => Ok(Json(backup)),
        Err(e) => error(e, &request_id),
    }
}
