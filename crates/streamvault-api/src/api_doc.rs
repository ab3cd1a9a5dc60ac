//! OpenAPI document served at `/api/openapi.json`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::video_upload::upload_video,
        crate::handlers::chunked_upload::upload_video_chunk,
        crate::handlers::caption_upload::upload_caption,
        crate::handlers::video_access::get_download_url,
        crate::handlers::video_access::set_visibility,
        crate::handlers::video_access::delete_video,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::handlers::chunked_upload::ChunkUploadProgressResponse,
        crate::handlers::video_access::DownloadUrlResponse,
        crate::handlers::video_access::SetVisibilityRequest,
        streamvault_core::models::VideoResponse,
        streamvault_core::models::ProcessingStatus,
        streamvault_core::models::Caption,
    )),
    tags(
        (name = "videos", description = "Video upload, captions, and access")
    )
)]
pub struct ApiDoc;
