//! Configuration module
//!
//! All runtime configuration is read from the environment in one place.
//! Every scanner credential is optional; a missing credential degrades that
//! scan backend to "not configured" instead of failing startup.

use std::env;
use std::path::PathBuf;

use anyhow::Context;

use crate::storage_types::StorageBackend;

const DEFAULT_MAX_VIDEO_SIZE_BYTES: u64 = 500 * 1024 * 1024;
const DEFAULT_MAX_THUMBNAIL_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_CAPTION_SIZE_BYTES: u64 = 2 * 1024 * 1024;
const DEFAULT_SIGNED_URL_EXPIRY_SECS: u64 = 60 * 60;
const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 30;
const DEFAULT_KEY_CACHE_TTL_SECS: i64 = 60 * 60;
const DEFAULT_CHUNK_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_CHUNK_SESSION_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// Base URL used to derive public embed links.
    pub public_base_url: String,

    // Upload staging
    pub staging_dir: PathBuf,
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    pub max_caption_size_bytes: u64,
    pub video_allowed_content_types: Vec<String>,
    pub thumbnail_allowed_content_types: Vec<String>,
    pub caption_allowed_content_types: Vec<String>,

    // Storage configuration
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<PathBuf>,
    pub local_storage_base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, etc.)
    pub s3_endpoint: Option<String>,
    pub signed_url_expiry_secs: u64,

    // Scan backends (each optional; absence disables that backend)
    pub virustotal_api_key: Option<String>,
    pub clamav_enabled: bool,
    pub clamav_host: String,
    pub clamav_port: u16,
    pub scan_timeout_secs: u64,

    // Authentication
    pub auth_disabled: bool,
    pub auth_certs_url: String,
    pub auth_audience: Option<String>,
    pub auth_key_cache_ttl_secs: i64,

    // Chunked upload sessions
    pub chunk_session_ttl_secs: u64,
    pub chunk_session_sweep_interval_secs: u64,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: {}", key, value)),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    match env::var(key) {
        Ok(value) => value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let storage_backend = {
            let raw = env_or("STORAGE_BACKEND", "local");
            StorageBackend::parse(&raw)
                .with_context(|| format!("Unknown STORAGE_BACKEND: {}", raw))?
        };

        let config = Config {
            server_port: env_parse("SERVER_PORT", 8080u16)?,
            cors_origins: env_list("CORS_ORIGINS", &[]),
            environment: env_or("ENVIRONMENT", "development"),
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:8080"),

            staging_dir: PathBuf::from(env_or("STAGING_DIR", "/tmp/streamvault-staging")),
            max_video_size_bytes: env_parse("MAX_VIDEO_SIZE_BYTES", DEFAULT_MAX_VIDEO_SIZE_BYTES)?,
            max_thumbnail_size_bytes: env_parse(
                "MAX_THUMBNAIL_SIZE_BYTES",
                DEFAULT_MAX_THUMBNAIL_SIZE_BYTES,
            )?,
            max_caption_size_bytes: env_parse(
                "MAX_CAPTION_SIZE_BYTES",
                DEFAULT_MAX_CAPTION_SIZE_BYTES,
            )?,
            video_allowed_content_types: env_list(
                "VIDEO_ALLOWED_CONTENT_TYPES",
                &[
                    "video/mp4",
                    "video/mpeg",
                    "video/quicktime",
                    "video/x-msvideo",
                    "video/x-flv",
                    "video/x-matroska",
                    "video/webm",
                    "video/ogg",
                ],
            ),
            thumbnail_allowed_content_types: env_list(
                "THUMBNAIL_ALLOWED_CONTENT_TYPES",
                &["image/jpeg", "image/png", "image/webp"],
            ),
            caption_allowed_content_types: env_list(
                "CAPTION_ALLOWED_CONTENT_TYPES",
                &["text/vtt", "application/x-subrip", "text/srt", "text/plain"],
            ),

            storage_backend,
            local_storage_path: env_opt("LOCAL_STORAGE_PATH").map(PathBuf::from),
            local_storage_base_url: env_opt("LOCAL_STORAGE_BASE_URL"),
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION"),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            signed_url_expiry_secs: env_parse(
                "SIGNED_URL_EXPIRY_SECS",
                DEFAULT_SIGNED_URL_EXPIRY_SECS,
            )?,

            virustotal_api_key: env_opt("VIRUSTOTAL_API_KEY"),
            clamav_enabled: env_bool("CLAMAV_ENABLED", false),
            clamav_host: env_or("CLAMAV_HOST", "localhost"),
            clamav_port: env_parse("CLAMAV_PORT", 3310u16)?,
            scan_timeout_secs: env_parse("SCAN_TIMEOUT_SECS", DEFAULT_SCAN_TIMEOUT_SECS)?,

            auth_disabled: env_bool("AUTH_DISABLED", false),
            auth_certs_url: env_or(
                "AUTH_CERTS_URL",
                "https://www.googleapis.com/oauth2/v3/certs",
            ),
            auth_audience: env_opt("AUTH_AUDIENCE"),
            auth_key_cache_ttl_secs: env_parse(
                "AUTH_KEY_CACHE_TTL_SECS",
                DEFAULT_KEY_CACHE_TTL_SECS,
            )?,

            chunk_session_ttl_secs: env_parse(
                "CHUNK_SESSION_TTL_SECS",
                DEFAULT_CHUNK_SESSION_TTL_SECS,
            )?,
            chunk_session_sweep_interval_secs: env_parse(
                "CHUNK_SESSION_SWEEP_INTERVAL_SECS",
                DEFAULT_CHUNK_SESSION_SWEEP_INTERVAL_SECS,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        match self.storage_backend {
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    anyhow::bail!("LOCAL_STORAGE_PATH is required when STORAGE_BACKEND=local");
                }
            }
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() || self.s3_region.is_none() {
                    anyhow::bail!("S3_BUCKET and S3_REGION are required when STORAGE_BACKEND=s3");
                }
            }
        }
        if self.max_video_size_bytes == 0 {
            anyhow::bail!("MAX_VIDEO_SIZE_BYTES must be greater than 0");
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Public embed link for an asset id.
    pub fn embed_link(&self, id: &uuid::Uuid) -> String {
        format!("{}/embed/{}", self.public_base_url.trim_end_matches('/'), id)
    }
}
