//! StreamVault core types
//!
//! Configuration, the unified error type, domain models, and the contracts
//! for the external metadata store.

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod storage_types;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use repository::{
    CaptionRepository, MemoryCaptionRepository, MemoryVideoRepository, VideoRepository,
};
pub use storage_types::StorageBackend;
