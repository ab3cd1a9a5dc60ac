//! Request-scoped staging of incoming upload bytes.
//!
//! Every upload request stages its multipart file fields into a private
//! directory under the configured staging root. The directory is removed on
//! every exit path; `Drop` keeps a synchronous backstop in case a panic or
//! early return skips the explicit cleanup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::Multipart;
use streamvault_core::AppError;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const MAX_FILENAME_LENGTH: usize = 255;
const MAX_TEXT_FIELD_LENGTH: usize = 8 * 1024;

/// A byte blob resident in transient local storage pending inspection/upload.
#[derive(Debug)]
pub struct StagedFile {
    pub path: PathBuf,
    pub original_filename: String,
    pub content_type: Option<String>,
    pub size: u64,
}

/// Private staging directory for one request.
pub struct RequestStaging {
    dir: PathBuf,
    cleaned: AtomicBool,
}

impl RequestStaging {
    pub async fn create(staging_root: &Path) -> Result<Self, AppError> {
        let dir = staging_root.join(format!("req-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create staging dir: {}", e)))?;
        Ok(RequestStaging {
            dir,
            cleaned: AtomicBool::new(false),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove the staging directory and everything in it.
    pub async fn cleanup(&self) {
        if self.cleaned.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    dir = %self.dir.display(),
                    error = %e,
                    "Failed to remove staging directory"
                );
            }
        }
    }
}

impl Drop for RequestStaging {
    fn drop(&mut self) {
        if !self.cleaned.swap(true, Ordering::SeqCst) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }
}

/// Parsed multipart request: staged file fields plus text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    files: HashMap<String, StagedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn take_file(&mut self, name: &str) -> Option<StagedFile> {
        self.files.remove(name)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }

    pub fn field_owned(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }
}

/// Stream a multipart request into the staging directory.
///
/// Fields named in `file_fields` are staged to disk; everything else is read
/// as text. A duplicated file field is rejected.
pub async fn read_multipart(
    multipart: &mut Multipart,
    staging: &RequestStaging,
    file_fields: &[&str],
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };

        if file_fields.contains(&name.as_str()) {
            if form.files.contains_key(&name) {
                return Err(AppError::InvalidInput(format!(
                    "Duplicate file field '{}'; send it exactly once",
                    name
                )));
            }

            let original_filename = field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let content_type = field.content_type().map(|s| s.to_string());

            let path = staging.dir.join(format!("{}-{}", name, Uuid::new_v4()));
            let mut file = tokio::fs::File::create(&path)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;

            let mut size: u64 = 0;
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?
            {
                size += chunk.len() as u64;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;
            }
            file.flush()
                .await
                .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;

            form.files.insert(
                name,
                StagedFile {
                    path,
                    original_filename,
                    content_type,
                    size,
                },
            );
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read field: {}", e)))?;
            if value.len() > MAX_TEXT_FIELD_LENGTH {
                return Err(AppError::InvalidInput(format!(
                    "Field '{}' exceeds maximum length",
                    name
                )));
            }
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Sanitize a filename to prevent path traversal and invalid characters.
/// Returns an error if the filename contains path traversal attempts.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    let path = Path::new(filename);
    let filename_only = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    if filename_only.contains("..") {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() || sanitized.len() < 3 {
        return Ok("file".to_string());
    }

    Ok(sanitized)
}

/// Sanitize a caller-supplied identifier used as a path segment (upload ids,
/// caption languages).
pub fn sanitize_path_segment(value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 64 {
        return Err(AppError::InvalidInput(
            "Identifier must be 1-64 characters".to_string(),
        ));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::InvalidInput(
            "Identifier may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
