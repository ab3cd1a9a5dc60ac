//! Shared application state.

use std::sync::Arc;

use streamvault_core::{CaptionRepository, Config, VideoRepository};
use streamvault_storage::Storage;

use crate::services::upload::{ChunkAssembler, IngestService};

pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub videos: Arc<dyn VideoRepository>,
    pub captions: Arc<dyn CaptionRepository>,
    pub ingest: IngestService,
    pub assembler: Arc<ChunkAssembler>,
}
