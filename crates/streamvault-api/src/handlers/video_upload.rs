//! Whole-file video upload.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use streamvault_core::models::{VideoAsset, VideoDeclaredMetadata, VideoResponse};
use streamvault_core::AppError;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload::{read_multipart, RequestStaging};
use crate::state::AppState;

/// Upload a video with an optional thumbnail
///
/// Multipart fields: `video` (required), `thumbnail` (optional), plus
/// `title`, `description`, `tags` (comma-separated), `is_public`.
#[utoipa::path(
    post,
    path = "/api/v1/videos/upload",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video uploaded", body = VideoResponse),
        (status = 400, description = "Missing file or security rejection", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Storage or metadata failure", body = ErrorResponse)
    )
)]
pub async fn upload_video(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let staging = RequestStaging::create(&state.config.staging_dir).await?;
    let result = handle_upload(&state, &user, &staging, &mut multipart).await;
    // Staging cleanup is unconditional: success and every error path.
    staging.cleanup().await;
    let video = result?;
    Ok((StatusCode::CREATED, Json(VideoResponse::from(video))))
}

async fn handle_upload(
    state: &AppState,
    user: &AuthUser,
    staging: &RequestStaging,
    multipart: &mut Multipart,
) -> Result<VideoAsset, AppError> {
    let mut form = read_multipart(multipart, staging, &["video", "thumbnail"]).await?;

    let video = form
        .take_file("video")
        .ok_or_else(|| AppError::InvalidInput("Video file is required".to_string()))?;
    let thumbnail = form.take_file("thumbnail");

    let metadata = VideoDeclaredMetadata::from_fields(
        form.field_owned("title"),
        form.field_owned("description"),
        form.field_owned("tags"),
        form.field_owned("is_public"),
    );

    tracing::info!(
        user_id = %user.id,
        filename = %video.original_filename,
        file_size = video.size,
        has_thumbnail = thumbnail.is_some(),
        "Starting video upload"
    );

    state
        .ingest
        .ingest_video(&user.id, &video, thumbnail.as_ref(), metadata)
        .await
}
