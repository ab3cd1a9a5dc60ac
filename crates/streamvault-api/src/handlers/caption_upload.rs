//! Caption upload for an existing video.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use streamvault_core::models::Caption;
use streamvault_core::AppError;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload::{read_multipart, RequestStaging};
use crate::state::AppState;

/// Upload a caption track for a video the caller owns
///
/// Multipart fields: `caption` (required), `language` (required),
/// `language_code` (optional, defaults to `language`).
#[utoipa::path(
    post,
    path = "/api/v1/videos/{video_id}/captions",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Caption uploaded", body = Caption),
        (status = 400, description = "Missing file or security rejection", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Storage or metadata failure", body = ErrorResponse)
    )
)]
pub async fn upload_caption(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let staging = RequestStaging::create(&state.config.staging_dir).await?;
    let result = handle_caption(&state, &user, video_id, &staging, &mut multipart).await;
    staging.cleanup().await;
    let caption = result?;
    Ok((StatusCode::CREATED, Json(caption)))
}

async fn handle_caption(
    state: &AppState,
    user: &AuthUser,
    video_id: Uuid,
    staging: &RequestStaging,
    multipart: &mut Multipart,
) -> Result<Caption, AppError> {
    let mut form = read_multipart(multipart, staging, &["caption"]).await?;

    let caption = form
        .take_file("caption")
        .ok_or_else(|| AppError::InvalidInput("Caption file is required".to_string()))?;

    let language = form
        .field_owned("language")
        .ok_or_else(|| AppError::InvalidInput("language is required".to_string()))?;
    let language_code = form
        .field_owned("language_code")
        .unwrap_or_else(|| language.clone());

    state
        .ingest
        .ingest_caption(&user.id, video_id, &language, &language_code, &caption)
        .await
}
