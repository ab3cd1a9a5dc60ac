//! Application wiring: storage backend, scan chain, inspectors, session
//! sweeper, and the router.

pub mod routes;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use streamvault_core::{
    CaptionRepository, Config, MemoryCaptionRepository, MemoryVideoRepository, StorageBackend,
    VideoRepository,
};
use streamvault_security::scan::{HashReputationScanner, HeuristicScanner, UploadScanner};
use streamvault_security::{ContentInspector, InspectorConfig, Scanner};
use streamvault_storage::Storage;

use crate::services::upload::{ChunkAssembler, IngestService};
use crate::state::AppState;

/// Initialize the application (storage, inspectors, assembler, routes).
pub async fn initialize_app(config: Config) -> anyhow::Result<(Arc<AppState>, Router)> {
    tokio::fs::create_dir_all(&config.staging_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create staging directory {}",
                config.staging_dir.display()
            )
        })?;

    let storage = build_storage(&config).await?;
    let videos: Arc<dyn VideoRepository> = MemoryVideoRepository::new();
    let captions: Arc<dyn CaptionRepository> = MemoryCaptionRepository::new();

    let scanners = build_scan_chain(&config);
    tracing::info!(backends = scanners.len(), "Scan chain configured");

    let (video_inspector, thumbnail_inspector, caption_inspector) =
        build_inspectors(&config, &scanners);

    let assembler = Arc::new(ChunkAssembler::new(config.staging_dir.join("chunks")));
    spawn_session_sweeper(assembler.clone(), &config);

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
        videos,
        captions,
        ingest,
        assembler,
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

async fn build_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackend::Local => {
            let path = config
                .local_storage_path
                .clone()
                .context("LOCAL_STORAGE_PATH is required for the local storage backend")?;
            let base_url = config.local_storage_base_url.clone().unwrap_or_else(|| {
                format!("{}/media", config.public_base_url.trim_end_matches('/'))
            });
            let storage = streamvault_storage::LocalStorage::new(path, base_url).await?;
            Ok(Arc::new(storage))
        }
        StorageBackend::S3 => {
            #[cfg(feature = "storage-s3")]
            {
                let bucket = config
                    .s3_bucket
                    .clone()
                    .context("S3_BUCKET is required for the S3 storage backend")?;
                let region = config
                    .s3_region
                    .clone()
                    .context("S3_REGION is required for the S3 storage backend")?;
                let storage =
                    streamvault_storage::S3Storage::new(bucket, region, config.s3_endpoint.clone())
                        .await?;
                Ok(Arc::new(storage))
            }
            #[cfg(not(feature = "storage-s3"))]
            {
                anyhow::bail!("S3 storage backend requires the storage-s3 feature")
            }
        }
    }
}

/// Build the scan-backend chain in priority order: hash-reputation lookup,
/// full upload-and-scan, local daemon, heuristic fallback. Backends without
/// credentials are simply not constructed.
fn build_scan_chain(config: &Config) -> Vec<Arc<dyn Scanner>> {
    let mut scanners: Vec<Arc<dyn Scanner>> = Vec::new();

    if let Some(api_key) = &config.virustotal_api_key {
        scanners.push(Arc::new(HashReputationScanner::new(api_key.clone())));
        scanners.push(Arc::new(UploadScanner::new(api_key.clone())));
    }

    #[cfg(feature = "clamav")]
    if config.clamav_enabled {
        scanners.push(Arc::new(streamvault_security::scan::ClamAvScanner::new(
            config.clamav_host.clone(),
            config.clamav_port,
        )));
    }

    scanners.push(Arc::new(HeuristicScanner::new()));

    scanners
}

fn build_inspectors(
    config: &Config,
    scanners: &[Arc<dyn Scanner>],
) -> (
    Arc<ContentInspector>,
    Arc<ContentInspector>,
    Arc<ContentInspector>,
) {
    let scan_timeout = Duration::from_secs(config.scan_timeout_secs);

    let video = Arc::new(ContentInspector::new(
        InspectorConfig {
            max_file_size_bytes: config.max_video_size_bytes,
            allowed_content_types: config.video_allowed_content_types.clone(),
        },
        scanners.to_vec(),
        scan_timeout,
    ));
    let thumbnail = Arc::new(ContentInspector::new(
        InspectorConfig {
            max_file_size_bytes: config.max_thumbnail_size_bytes,
            allowed_content_types: config.thumbnail_allowed_content_types.clone(),
        },
        scanners.to_vec(),
        scan_timeout,
    ));
    let caption = Arc::new(ContentInspector::new(
        InspectorConfig {
            max_file_size_bytes: config.max_caption_size_bytes,
            allowed_content_types: config.caption_allowed_content_types.clone(),
        },
        scanners.to_vec(),
        scan_timeout,
    ));

    (video, thumbnail, caption)
}

fn spawn_session_sweeper(assembler: Arc<ChunkAssembler>, config: &Config) {
    if config.chunk_session_sweep_interval_secs == 0 {
        return;
    }
    let interval = Duration::from_secs(config.chunk_session_sweep_interval_secs);
    let ttl = Duration::from_secs(config.chunk_session_ttl_secs);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; nothing to reap yet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let reaped = assembler.reap_stale(ttl).await;
            if reaped > 0 {
                tracing::info!(reaped = reaped, "Reaped stale upload sessions");
            }
        }
    });
}
