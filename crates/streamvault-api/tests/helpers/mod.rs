//! Shared test fixtures: an app wired against temp directories, an in-memory
//! metadata store, the heuristic-only scan chain, and a failure-injecting
//! storage double.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use streamvault_api::services::upload::{ChunkAssembler, IngestService};
use streamvault_api::setup::routes::setup_routes;
use streamvault_api::state::AppState;
use streamvault_core::models::{ProcessingStatus, VideoAsset};
use streamvault_core::{
    Config, MemoryCaptionRepository, MemoryVideoRepository, StorageBackend,
};
use streamvault_security::scan::HeuristicScanner;
use streamvault_security::{ContentInspector, InspectorConfig, Scanner};
use streamvault_storage::{LocalStorage, Storage, StorageError, StorageResult};
use uuid::Uuid;

/// The fixed identity the auth layer injects when validation is disabled.
pub const DEV_USER_ID: &str = "dev-user";

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub videos: Arc<MemoryVideoRepository>,
    pub captions: Arc<MemoryCaptionRepository>,
    pub staging_root: PathBuf,
    _staging_dir: tempfile::TempDir,
    _media_dir: tempfile::TempDir,
}

impl TestApp {
    /// Request-scoped staging directories left behind after a request.
    pub fn leftover_staging_dirs(&self) -> usize {
        std::fs::read_dir(&self.staging_root)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_name().to_string_lossy().starts_with("req-"))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Seed a committed video owned by `owner_id`, bypassing the pipeline.
    pub async fn seed_video(&self, owner_id: &str, is_public: bool) -> VideoAsset {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let asset = VideoAsset {
            id,
            owner_id: owner_id.to_string(),
            title: "Seeded".to_string(),
            description: None,
            tags: vec![],
            original_filename: "seeded.mp4".to_string(),
            storage_key: format!("videos/{}/{}/video/seeded.mp4", owner_id, id),
            video_url: format!("http://localhost:8080/media/videos/{}/{}/video/seeded.mp4", owner_id, id),
            thumbnail_url: None,
            folder_path: format!("videos/{}/{}", owner_id, id),
            content_type: "video/mp4".to_string(),
            file_size: 4,
            is_public,
            embed_link: format!("http://localhost:8080/embed/{}", id),
            processing_status: ProcessingStatus::Pending,
            view_count: 0,
            deleted_at: None,
            uploaded_at: now,
            updated_at: now,
        };
        use streamvault_core::VideoRepository;
        self.videos.create_video(asset).await.unwrap()
    }
}

pub fn test_config(staging_dir: PathBuf, media_dir: PathBuf) -> Config {
    Config {
        server_port: 0,
        cors_origins: vec![],
        environment: "test".to_string(),
        public_base_url: "http://localhost:8080".to_string(),
        staging_dir,
        max_video_size_bytes: 10 * 1024 * 1024,
        max_thumbnail_size_bytes: 1024 * 1024,
        max_caption_size_bytes: 256 * 1024,
        video_allowed_content_types: vec![
            "video/mp4".to_string(),
            "video/webm".to_string(),
            "video/quicktime".to_string(),
        ],
        thumbnail_allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
        caption_allowed_content_types: vec!["text/vtt".to_string(), "text/plain".to_string()],
        storage_backend: StorageBackend::Local,
        local_storage_path: Some(media_dir),
        local_storage_base_url: Some("http://localhost:8080/media".to_string()),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        signed_url_expiry_secs: 3600,
        virustotal_api_key: None,
        clamav_enabled: false,
        clamav_host: "localhost".to_string(),
        clamav_port: 3310,
        scan_timeout_secs: 5,
        auth_disabled: true,
        auth_certs_url: "http://127.0.0.1:1/certs".to_string(),
        auth_audience: None,
        auth_key_cache_ttl_secs: 3600,
        chunk_session_ttl_secs: 3600,
        chunk_session_sweep_interval_secs: 0,
    }
}

pub async fn build_app() -> TestApp {
    build_app_with(|_| {}).await
}

pub async fn build_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let staging_dir = tempfile::tempdir().unwrap();
    let media_dir = tempfile::tempdir().unwrap();
    let config = {
        let mut config = test_config(
            staging_dir.path().to_path_buf(),
            media_dir.path().to_path_buf(),
        );
        adjust(&mut config);
        config
    };

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(
            config.local_storage_path.clone().unwrap(),
            config.local_storage_base_url.clone().unwrap(),
        )
        .await
        .unwrap(),
    );

    build_app_inner(config, storage, staging_dir, media_dir).await
}

/// Build an app whose storage gateway fails every upload.
pub async fn build_app_with_failing_storage() -> TestApp {
    let staging_dir = tempfile::tempdir().unwrap();
    let media_dir = tempfile::tempdir().unwrap();
    let config = test_config(
        staging_dir.path().to_path_buf(),
        media_dir.path().to_path_buf(),
    );

    let storage: Arc<dyn Storage> = Arc::new(FailingStorage);

    build_app_inner(config, storage, staging_dir, media_dir).await
}

async fn build_app_inner(
    config: Config,
    storage: Arc<dyn Storage>,
    staging_dir: tempfile::TempDir,
    media_dir: tempfile::TempDir,
) -> TestApp {
    let videos = MemoryVideoRepository::new();
    let captions = MemoryCaptionRepository::new();

    let scanners: Vec<Arc<dyn Scanner>> = vec![Arc::new(HeuristicScanner::new())];
    let scan_timeout = Duration::from_secs(config.scan_timeout_secs);

    let video_inspector = Arc::new(ContentInspector::new(
        InspectorConfig {
            max_file_size_bytes: config.max_video_size_bytes,
            allowed_content_types: config.video_allowed_content_types.clone(),
        },
        scanners.clone(),
        scan_timeout,
    ));
    let thumbnail_inspector = Arc::new(ContentInspector::new(
        InspectorConfig {
            max_file_size_bytes: config.max_thumbnail_size_bytes,
            allowed_content_types: config.thumbnail_allowed_content_types.clone(),
        },
        scanners.clone(),
        scan_timeout,
    ));
    let caption_inspector = Arc::new(ContentInspector::new(
        InspectorConfig {
            max_file_size_bytes: config.max_caption_size_bytes,
            allowed_content_types: config.caption_allowed_content_types.clone(),
        },
        scanners.clone(),
        scan_timeout,
    ));

    let assembler = Arc::new(ChunkAssembler::new(config.staging_dir.join("chunks")));

    let ingest = IngestService::new(
        config.clone(),
        storage.clone(),
        videos.clone(),
        captions.clone(),
        video_inspector,
        thumbnail_inspector,
        caption_inspector,
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        storage,
        videos: videos.clone(),
        captions: captions.clone(),
        ingest,
        assembler,
    });

    let router = setup_routes(&config, state.clone()).unwrap();
    let server = TestServer::new(router).unwrap();

    TestApp {
        server,
        state,
        videos,
        captions,
        staging_root: config.staging_dir.clone(),
        _staging_dir: staging_dir,
        _media_dir: media_dir,
    }
}

/// Storage double that refuses every upload, for atomicity tests.
pub struct FailingStorage;

#[async_trait]
impl Storage for FailingStorage {
    async fn upload(
        &self,
        _storage_key: &str,
        _content_type: &str,
        _data: Vec<u8>,
    ) -> StorageResult<String> {
        Err(StorageError::UploadFailed(
            "simulated storage outage".to_string(),
        ))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        Err(StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, _storage_key: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn delete_prefix(&self, _prefix: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn signed_url(
        &self,
        _storage_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::BackendError("unavailable".to_string()))
    }

    async fn exists(&self, _storage_key: &str) -> StorageResult<bool> {
        Ok(false)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// A plausible media payload: an MP4 ftyp header followed by filler.
pub fn fake_mp4(len: usize) -> Vec<u8> {
    let mut data = b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42isom".to_vec();
    while data.len() < len {
        data.push(0x11);
    }
    data.truncate(len.max(1));
    data
}
