//! Upload ingestion coordinator.
//!
//! Every upload (whole-file or assembled-from-chunks) passes through the same
//! pipeline: inspect -> store -> commit. The invariant maintained here is
//! that a video record exists iff the bytes it references are durably stored
//! and passed inspection. Callers own staging cleanup and run it on every
//! exit path.

use std::sync::Arc;

use chrono::Utc;
use streamvault_core::models::{Caption, ProcessingStatus, VideoAsset, VideoDeclaredMetadata};
use streamvault_core::{AppError, CaptionRepository, Config, VideoRepository};
use streamvault_security::ContentInspector;
use streamvault_storage::keys::{asset_prefix, object_key, AssetRole};
use streamvault_storage::Storage;
use uuid::Uuid;

use super::staging::{sanitize_filename, sanitize_path_segment, StagedFile};

pub struct IngestService {
    config: Config,
    storage: Arc<dyn Storage>,
    videos: Arc<dyn VideoRepository>,
    captions: Arc<dyn CaptionRepository>,
    video_inspector: Arc<ContentInspector>,
    thumbnail_inspector: Arc<ContentInspector>,
    caption_inspector: Arc<ContentInspector>,
}

impl IngestService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        videos: Arc<dyn VideoRepository>,
        captions: Arc<dyn CaptionRepository>,
        video_inspector: Arc<ContentInspector>,
        thumbnail_inspector: Arc<ContentInspector>,
        caption_inspector: Arc<ContentInspector>,
    ) -> Self {
        Self {
            config,
            storage,
            videos,
            captions,
            video_inspector,
            thumbnail_inspector,
            caption_inspector,
        }
    }

    /// Ingest one video with an optional thumbnail: inspect both, upload to
    /// durable storage under a fresh asset id, then commit the record.
    pub async fn ingest_video(
        &self,
        owner_id: &str,
        video: &StagedFile,
        thumbnail: Option<&StagedFile>,
        metadata: VideoDeclaredMetadata,
    ) -> Result<VideoAsset, AppError> {
        // Inspections run before any durable write. A thumbnail rejection
        // aborts the whole request even though the video already passed.
        self.inspect_staged(&self.video_inspector, video, "video")
            .await?;
        if let Some(thumbnail) = thumbnail {
            self.inspect_staged(&self.thumbnail_inspector, thumbnail, "thumbnail")
                .await?;
        }

        let asset_id = Uuid::new_v4();
        let folder_path = asset_prefix(owner_id, &asset_id);

        tracing::info!(
            asset_id = %asset_id,
            owner_id = %owner_id,
            file_size = video.size,
            "Processing video upload"
        );

        let video_filename = sanitize_filename(&video.original_filename)?;
        let video_key = object_key(owner_id, &asset_id, &AssetRole::Video, &video_filename);
        let video_url = self
            .upload_staged(video, &video_key)
            .await
            .inspect_err(|e| {
                tracing::error!(asset_id = %asset_id, error = %e, "Video upload to storage failed");
            })?;

        let thumbnail_url = match thumbnail {
            Some(thumbnail) => {
                let thumbnail_filename = sanitize_filename(&thumbnail.original_filename)?;
                let key = object_key(
                    owner_id,
                    &asset_id,
                    &AssetRole::Thumbnail,
                    &thumbnail_filename,
                );
                match self.upload_staged(thumbnail, &key).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        // The video object is already durable; remove it so a
                        // failed request leaves nothing behind.
                        tracing::error!(
                            asset_id = %asset_id,
                            error = %e,
                            "Thumbnail upload to storage failed"
                        );
                        self.compensate_prefix(&folder_path).await;
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        let now = Utc::now();
        let asset = VideoAsset {
            id: asset_id,
            owner_id: owner_id.to_string(),
            title: metadata.title_or_untitled(),
            description: metadata.description.clone(),
            tags: metadata.tags.clone(),
            original_filename: video_filename,
            storage_key: video_key,
            video_url,
            thumbnail_url,
            folder_path: folder_path.clone(),
            content_type: video
                .content_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            file_size: video.size as i64,
            is_public: metadata.is_public,
            embed_link: self.config.embed_link(&asset_id),
            processing_status: ProcessingStatus::Pending,
            view_count: 0,
            deleted_at: None,
            uploaded_at: now,
            updated_at: now,
        };

        match self.videos.create_video(asset).await {
            Ok(asset) => {
                tracing::info!(asset_id = %asset.id, "Video record committed");
                Ok(asset)
            }
            Err(e) => {
                // Without the record the stored objects are unreachable;
                // remove them so nothing durable leaks from a failed request.
                tracing::error!(
                    asset_id = %asset_id,
                    folder_path = %folder_path,
                    error = %e,
                    "Metadata commit failed after storage upload"
                );
                self.compensate_prefix(&folder_path).await;
                Err(e)
            }
        }
    }

    /// Ingest a caption for an existing video owned by the caller.
    pub async fn ingest_caption(
        &self,
        owner_id: &str,
        video_id: Uuid,
        language: &str,
        language_code: &str,
        caption: &StagedFile,
    ) -> Result<Caption, AppError> {
        let video = self
            .videos
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video not found: {}", video_id)))?;

        if video.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "You do not own this video".to_string(),
            ));
        }

        let language = sanitize_path_segment(language)?;

        self.inspect_staged(&self.caption_inspector, caption, "caption")
            .await?;

        let filename = sanitize_filename(&caption.original_filename)?;
        let key = object_key(
            owner_id,
            &video_id,
            &AssetRole::Caption {
                language: language.clone(),
            },
            &filename,
        );
        let url = self.upload_staged(caption, &key).await?;

        let record = Caption {
            id: Uuid::new_v4(),
            video_id,
            language,
            language_code: language_code.to_string(),
            caption_url: url,
            storage_key: key.clone(),
            file_size: caption.size as i64,
            created_at: Utc::now(),
        };

        match self.captions.create_caption(record).await {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::error!(
                    video_id = %video_id,
                    storage_key = %key,
                    error = %e,
                    "Caption metadata commit failed after storage upload"
                );
                if let Err(delete_err) = self.storage.delete(&key).await {
                    tracing::warn!(
                        storage_key = %key,
                        error = %delete_err,
                        "Failed to remove orphaned caption object"
                    );
                }
                Err(e)
            }
        }
    }

    async fn inspect_staged(
        &self,
        inspector: &ContentInspector,
        staged: &StagedFile,
        label: &str,
    ) -> Result<(), AppError> {
        let report = inspector
            .inspect(
                &staged.path,
                &staged.original_filename,
                staged.content_type.as_deref(),
            )
            .await?;

        if !report.valid {
            tracing::warn!(
                label = label,
                filename = %staged.original_filename,
                errors = ?report.errors,
                "Upload rejected by security checks"
            );
            return Err(AppError::SecurityRejected {
                errors: report.errors,
                warnings: report.warnings,
            });
        }

        if !report.warnings.is_empty() {
            tracing::warn!(
                label = label,
                filename = %staged.original_filename,
                warnings = ?report.warnings,
                "Security checks passed with warnings"
            );
        }

        Ok(())
    }

    async fn upload_staged(&self, staged: &StagedFile, key: &str) -> Result<String, AppError> {
        let data = tokio::fs::read(&staged.path)
            .await
            .map_err(|e| AppError::Internal(format!("Cannot read staged file: {}", e)))?;
        let content_type = staged
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        self.storage
            .upload(key, content_type, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload {}: {}", key, e)))
    }

    async fn compensate_prefix(&self, prefix: &str) {
        if let Err(e) = self.storage.delete_prefix(prefix).await {
            tracing::warn!(
                prefix = %prefix,
                error = %e,
                "Failed to remove orphaned storage objects"
            );
        }
    }
}
