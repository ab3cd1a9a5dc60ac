//! Thin metadata operations: signed download URLs, visibility, soft delete.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use streamvault_core::models::VideoResponse;
use streamvault_core::AppError;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadUrlResponse {
    pub download_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetVisibilityRequest {
    pub is_public: bool,
}

/// Get a time-limited download URL for a video
///
/// The caller must own the video or the video must be public.
#[utoipa::path(
    get,
    path = "/api/v1/videos/{video_id}/download-url",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Signed download URL", body = DownloadUrlResponse),
        (status = 403, description = "No access to this video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
pub async fn get_download_url(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state
        .videos
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video not found: {}", video_id)))?;

    if !video.is_public && video.owner_id != user.id {
        return Err(AppError::Forbidden("You do not have access to this video".to_string()).into());
    }

    let expires_in = Duration::from_secs(state.config.signed_url_expiry_secs);
    let download_url = state
        .storage
        .signed_url(&video.storage_key, expires_in)
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(DownloadUrlResponse { download_url }))
}

/// Set a video's visibility
#[utoipa::path(
    patch,
    path = "/api/v1/videos/{video_id}/visibility",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    request_body = SetVisibilityRequest,
    responses(
        (status = 200, description = "Visibility updated", body = VideoResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
pub async fn set_visibility(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
    Json(request): Json<SetVisibilityRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state
        .videos
        .set_visibility(video_id, &user.id, request.is_public)
        .await?;

    tracing::info!(
        video_id = %video_id,
        is_public = request.is_public,
        "Video visibility updated"
    );

    Ok(Json(VideoResponse::from(video)))
}

/// Soft-delete a video
#[utoipa::path(
    delete,
    path = "/api/v1/videos/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
pub async fn delete_video(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.videos.soft_delete(video_id, &user.id).await?;

    tracing::info!(video_id = %video_id, user_id = %user.id, "Video soft-deleted");

    Ok(StatusCode::NO_CONTENT)
}
