//! The upload pipeline: request staging, chunk reassembly, and the
//! inspect -> store -> commit coordinator.

pub mod assembler;
pub mod service;
pub mod staging;

pub use assembler::{AssembledUpload, ChunkAssembler, ChunkOutcome, SessionProgress};
pub use service::IngestService;
pub use staging::{read_multipart, RequestStaging, StagedFile, UploadForm};
