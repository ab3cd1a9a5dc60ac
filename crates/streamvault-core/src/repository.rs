//! Metadata-collaborator contracts.
//!
//! The metadata store is an external service; these traits describe the
//! operations the ingestion pipeline needs from it. The in-memory
//! implementations stand in for it in tests and standalone deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Caption, VideoAsset};

#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Commit a new video record. Must be called exactly once per ingestion,
    /// after the referenced bytes are durably stored.
    async fn create_video(&self, video: VideoAsset) -> Result<VideoAsset, AppError>;

    /// Fetch a video by id. Soft-deleted records are not returned.
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoAsset>, AppError>;

    /// Flip a video between public and private. Only the owner may do this.
    async fn set_visibility(
        &self,
        id: Uuid,
        owner_id: &str,
        is_public: bool,
    ) -> Result<VideoAsset, AppError>;

    /// Soft-delete a video. Only the owner may do this.
    async fn soft_delete(&self, id: Uuid, owner_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait CaptionRepository: Send + Sync {
    async fn create_caption(&self, caption: Caption) -> Result<Caption, AppError>;

    async fn list_for_video(&self, video_id: Uuid) -> Result<Vec<Caption>, AppError>;
}

/// In-memory video store.
#[derive(Default)]
pub struct MemoryVideoRepository {
    videos: RwLock<HashMap<Uuid, VideoAsset>>,
}

impl MemoryVideoRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of records, soft-deleted included.
    pub async fn count(&self) -> usize {
        self.videos.read().await.len()
    }

    fn owned(video: &VideoAsset, owner_id: &str) -> Result<(), AppError> {
        if video.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "You do not own this video".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VideoRepository for MemoryVideoRepository {
    async fn create_video(&self, video: VideoAsset) -> Result<VideoAsset, AppError> {
        let mut videos = self.videos.write().await;
        if videos.contains_key(&video.id) {
            return Err(AppError::MetadataStore(format!(
                "Video {} already exists",
                video.id
            )));
        }
        videos.insert(video.id, video.clone());
        Ok(video)
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<VideoAsset>, AppError> {
        let videos = self.videos.read().await;
        Ok(videos.get(&id).filter(|v| !v.is_deleted()).cloned())
    }

    async fn set_visibility(
        &self,
        id: Uuid,
        owner_id: &str,
        is_public: bool,
    ) -> Result<VideoAsset, AppError> {
        let mut videos = self.videos.write().await;
        let video = videos
            .get_mut(&id)
            .filter(|v| !v.is_deleted())
            .ok_or_else(|| AppError::NotFound(format!("Video not found: {}", id)))?;
        Self::owned(video, owner_id)?;
        video.is_public = is_public;
        video.updated_at = Utc::now();
        Ok(video.clone())
    }

    async fn soft_delete(&self, id: Uuid, owner_id: &str) -> Result<(), AppError> {
        let mut videos = self.videos.write().await;
        let video = videos
            .get_mut(&id)
            .filter(|v| !v.is_deleted())
            .ok_or_else(|| AppError::NotFound(format!("Video not found: {}", id)))?;
        Self::owned(video, owner_id)?;
        video.deleted_at = Some(Utc::now());
        video.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory caption store.
#[derive(Default)]
pub struct MemoryCaptionRepository {
    captions: RwLock<HashMap<Uuid, Caption>>,
}

impl MemoryCaptionRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn count(&self) -> usize {
        self.captions.read().await.len()
    }
}

#[async_trait]
impl CaptionRepository for MemoryCaptionRepository {
    async fn create_caption(&self, caption: Caption) -> Result<Caption, AppError> {
        let mut captions = self.captions.write().await;
        captions.insert(caption.id, caption.clone());
        Ok(caption)
    }

    async fn list_for_video(&self, video_id: Uuid) -> Result<Vec<Caption>, AppError> {
        let captions = self.captions.read().await;
        let mut result: Vec<Caption> = captions
            .values()
            .filter(|c| c.video_id == video_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }
}
