//! Storage backend identifiers shared by configuration and the storage crate.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Which durable storage backend a deployment uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

impl StorageBackend {
    /// Parse a backend name from configuration ("s3" or "local").
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "s3" => Some(StorageBackend::S3),
            "local" => Some(StorageBackend::Local),
            _ => None,
        }
    }
}
