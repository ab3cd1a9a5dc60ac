//! Domain models.

mod caption;
mod upload;
mod video;

pub use caption::Caption;
pub use upload::VideoDeclaredMetadata;
pub use video::{ProcessingStatus, VideoAsset, VideoResponse};
