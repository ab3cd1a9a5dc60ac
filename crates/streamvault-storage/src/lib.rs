//! StreamVault storage gateway
//!
//! Durable object storage behind the [`Storage`] trait, with a local
//! filesystem backend and a feature-gated S3 backend. Keys follow the
//! `videos/{owner_id}/{asset_id}/{role}/{filename}` layout from [`keys`].

pub mod keys;
#[cfg(feature = "storage-local")]
mod local;
#[cfg(feature = "storage-s3")]
mod s3;
mod traits;

#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use streamvault_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};
