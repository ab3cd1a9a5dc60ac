//! Chunked upload for large files.
//!
//! Chunks arrive in any order keyed by a caller-chosen `upload_id`. Each
//! chunk gets a progress response; the chunk that completes the session
//! triggers assembly, and the assembled file enters the same
//! inspect/store/commit path as a whole-file upload.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use streamvault_core::models::{VideoDeclaredMetadata, VideoResponse};
use streamvault_core::AppError;
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload::{read_multipart, ChunkOutcome, RequestStaging, StagedFile};
use crate::state::AppState;

/// Progress for a chunk received while the session is still incomplete.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChunkUploadProgressResponse {
    pub upload_id: String,
    pub chunk_index: u32,
    pub received_chunks: u32,
    pub total_chunks: u32,
}

/// Upload one chunk of a video
///
/// Multipart fields: `chunk` (binary, required), `upload_id`, `chunk_index`,
/// `total_chunks`, plus the declared metadata fields (accepted on every
/// chunk; the completing chunk's values win).
#[utoipa::path(
    post,
    path = "/api/v1/videos/upload-chunk",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Chunk received, session incomplete", body = ChunkUploadProgressResponse),
        (status = 201, description = "Final chunk received, video created", body = VideoResponse),
        (status = 400, description = "Invalid chunk or security rejection", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Storage or metadata failure", body = ErrorResponse)
    )
)]
pub async fn upload_video_chunk(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let staging = RequestStaging::create(&state.config.staging_dir).await?;
    let result = handle_chunk(&state, &user, &staging, &mut multipart).await;
    staging.cleanup().await;
    result.map_err(HttpAppError::from)
}

async fn handle_chunk(
    state: &AppState,
    user: &AuthUser,
    staging: &RequestStaging,
    multipart: &mut Multipart,
) -> Result<Response, AppError> {
    let mut form = read_multipart(multipart, staging, &["chunk"]).await?;

    let chunk = form
        .take_file("chunk")
        .ok_or_else(|| AppError::InvalidInput("Chunk file is required".to_string()))?;

    let (Some(upload_id), Some(chunk_index), Some(total_chunks)) = (
        form.field_owned("upload_id"),
        form.field("chunk_index"),
        form.field("total_chunks"),
    ) else {
        return Err(AppError::InvalidInput(
            "upload_id, chunk_index, and total_chunks are required".to_string(),
        ));
    };

    let chunk_index: u32 = chunk_index
        .parse()
        .map_err(|_| AppError::InvalidInput("chunk_index must be a non-negative integer".to_string()))?;
    let total_chunks: u32 = total_chunks
        .parse()
        .map_err(|_| AppError::InvalidInput("total_chunks must be a positive integer".to_string()))?;

    // Cheap per-chunk guards; the assembled file gets the full inspection.
    if chunk.size == 0 {
        return Err(AppError::InvalidInput("Chunk file is empty".to_string()));
    }
    if chunk.size > state.config.max_video_size_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "Chunk exceeds maximum upload size of {} MB",
            state.config.max_video_size_bytes / 1024 / 1024
        )));
    }

    let metadata = VideoDeclaredMetadata::from_fields(
        form.field_owned("title"),
        form.field_owned("description"),
        form.field_owned("tags"),
        form.field_owned("is_public"),
    );

    tracing::info!(
        upload_id = %upload_id,
        chunk_index = chunk_index,
        total_chunks = total_chunks,
        user_id = %user.id,
        "Chunk received"
    );

    let outcome = state
        .assembler
        .store_chunk(
            &upload_id,
            &user.id,
            chunk_index,
            total_chunks,
            chunk,
            metadata,
        )
        .await?;

    match outcome {
        ChunkOutcome::Progress(progress) => Ok((
            StatusCode::OK,
            Json(ChunkUploadProgressResponse {
                upload_id,
                chunk_index,
                received_chunks: progress.received_chunks,
                total_chunks: progress.total_chunks,
            }),
        )
            .into_response()),
        ChunkOutcome::Complete(ticket) => {
            let assembled = state.assembler.assemble(ticket, staging.dir()).await?;

            let staged = StagedFile {
                path: assembled.path.clone(),
                original_filename: format!("{}.mp4", assembled.metadata.title_or_untitled()),
                content_type: Some("video/mp4".to_string()),
                size: assembled.total_bytes,
            };

            let video = state
                .ingest
                .ingest_video(&user.id, &staged, None, assembled.metadata)
                .await?;

            Ok((StatusCode::CREATED, Json(VideoResponse::from(video))).into_response())
        }
    }
}
