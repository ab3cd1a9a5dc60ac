use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A caption track attached to a video.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Caption {
    pub id: Uuid,
    pub video_id: Uuid,
    pub language: String,
    pub language_code: String,
    pub caption_url: String,
    pub storage_key: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}
