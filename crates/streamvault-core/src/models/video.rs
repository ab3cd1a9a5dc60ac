use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl Display for ProcessingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProcessingStatus::Pending => write!(f, "pending"),
            ProcessingStatus::Processing => write!(f, "processing"),
            ProcessingStatus::Completed => write!(f, "completed"),
            ProcessingStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A committed video record. Created exactly once per successful ingestion,
/// only after the bytes it references are durably stored and passed inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoAsset {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub original_filename: String,
    pub storage_key: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    /// Storage prefix holding every object for this asset.
    pub folder_path: String,
    pub content_type: String,
    pub file_size: i64,
    pub is_public: bool,
    pub embed_link: String,
    pub processing_status: ProcessingStatus,
    pub view_count: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoAsset {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Video record as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub filename: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub content_type: String,
    pub file_size: i64,
    pub is_public: bool,
    pub embed_link: String,
    pub processing_status: ProcessingStatus,
    pub view_count: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<VideoAsset> for VideoResponse {
    fn from(video: VideoAsset) -> Self {
        VideoResponse {
            id: video.id,
            title: video.title,
            description: video.description,
            tags: video.tags,
            filename: video.original_filename,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            content_type: video.content_type,
            file_size: video.file_size,
            is_public: video.is_public,
            embed_link: video.embed_link,
            processing_status: video.processing_status,
            view_count: video.view_count,
            uploaded_at: video.uploaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_status_display() {
        assert_eq!(ProcessingStatus::Pending.to_string(), "pending");
        assert_eq!(ProcessingStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn processing_status_serializes_lowercase() {
        let json = serde_json::to_string(&ProcessingStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
