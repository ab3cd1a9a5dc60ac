//! Shared key generation for storage backends.
//!
//! Layout: `videos/{owner_id}/{asset_id}/{role}/{filename}` where role is
//! `video`, `thumbnail`, or `caption/{language}`. All backends must use this
//! format so metadata records stay portable across backends.

use uuid::Uuid;

const COLLECTION: &str = "videos";

/// The role an object plays within an asset's folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRole {
    Video,
    Thumbnail,
    Caption { language: String },
}

impl AssetRole {
    fn path_segment(&self) -> String {
        match self {
            AssetRole::Video => "video".to_string(),
            AssetRole::Thumbnail => "thumbnail".to_string(),
            AssetRole::Caption { language } => format!("caption/{}", language),
        }
    }
}

/// Storage prefix holding every object for one asset.
pub fn asset_prefix(owner_id: &str, asset_id: &Uuid) -> String {
    format!("{}/{}/{}", COLLECTION, owner_id, asset_id)
}

/// Full object key for a file within an asset's folder.
pub fn object_key(owner_id: &str, asset_id: &Uuid, role: &AssetRole, filename: &str) -> String {
    format!(
        "{}/{}/{}",
        asset_prefix(owner_id, asset_id),
        role.path_segment(),
        filename
    )
}
