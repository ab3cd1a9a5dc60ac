//! Chunked-upload session tracking and reassembly.
//!
//! Each `upload_id` owns an explicit session record with a state machine:
//! `Open -> Assembling -> Done | Failed`. Chunk writes are idempotent per
//! index; completeness is checked under the per-session lock after every
//! write, and the `Open -> Assembling` transition hands an assembly ticket
//! to exactly one caller even when the final chunks race.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use streamvault_core::models::VideoDeclaredMetadata;
use streamvault_core::AppError;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::staging::{sanitize_path_segment, StagedFile};

const MAX_CHUNK_COUNT: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Open,
    Assembling,
    Done,
    Failed,
}

#[derive(Debug)]
struct SessionInner {
    owner_id: String,
    total_chunks: u32,
    received: HashSet<u32>,
    state: SessionState,
    dir: PathBuf,
    metadata: VideoDeclaredMetadata,
    last_activity: Instant,
}

/// Progress snapshot returned for every chunk received while the session is
/// still open, so clients can track completion without a separate poll.
#[derive(Debug, Clone, Copy)]
pub struct SessionProgress {
    pub received_chunks: u32,
    pub total_chunks: u32,
}

/// Handed to exactly one caller when its chunk completes the session.
#[derive(Debug)]
pub struct AssemblyTicket {
    upload_id: String,
    session: Arc<Mutex<SessionInner>>,
}

#[derive(Debug)]
pub enum ChunkOutcome {
    Progress(SessionProgress),
    Complete(AssemblyTicket),
}

/// The reassembled file plus the metadata carried by the session.
pub struct AssembledUpload {
    pub path: PathBuf,
    pub metadata: VideoDeclaredMetadata,
    pub total_bytes: u64,
}

pub struct ChunkAssembler {
    root: PathBuf,
    sessions: Mutex<HashMap<String, Arc<Mutex<SessionInner>>>>,
}

impl ChunkAssembler {
    /// `root` is the directory holding per-session chunk directories.
    pub fn new(root: PathBuf) -> Self {
        ChunkAssembler {
            root,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Persist one chunk and report session progress. Returns an assembly
    /// ticket iff this chunk made the session complete.
    pub async fn store_chunk(
        &self,
        upload_id: &str,
        owner_id: &str,
        chunk_index: u32,
        total_chunks: u32,
        chunk: StagedFile,
        metadata: VideoDeclaredMetadata,
    ) -> Result<ChunkOutcome, AppError> {
        let upload_id = sanitize_path_segment(upload_id)?;

        if total_chunks == 0 {
            return Err(AppError::InvalidInput(
                "total_chunks must be greater than 0".to_string(),
            ));
        }
        if total_chunks > MAX_CHUNK_COUNT {
            return Err(AppError::InvalidInput(format!(
                "total_chunks {} exceeds maximum {}",
                total_chunks, MAX_CHUNK_COUNT
            )));
        }
        if chunk_index >= total_chunks {
            return Err(AppError::InvalidInput(format!(
                "chunk_index {} out of range for {} chunks",
                chunk_index, total_chunks
            )));
        }

        let session = {
            let mut sessions = self.sessions.lock().await;
            sessions
                .entry(upload_id.clone())
                .or_insert_with(|| {
                    Arc::new(Mutex::new(SessionInner {
                        owner_id: owner_id.to_string(),
                        total_chunks,
                        received: HashSet::new(),
                        state: SessionState::Open,
                        dir: self.root.join(&upload_id),
                        metadata: VideoDeclaredMetadata::default(),
                        last_activity: Instant::now(),
                    }))
                })
                .clone()
        };

        let mut inner = session.lock().await;

        if inner.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Upload session belongs to another user".to_string(),
            ));
        }
        if inner.total_chunks != total_chunks {
            return Err(AppError::InvalidInput(format!(
                "total_chunks mismatch: session was started with {}",
                inner.total_chunks
            )));
        }
        if inner.state != SessionState::Open {
            return Err(AppError::BadRequest(
                "Upload session is no longer accepting chunks".to_string(),
            ));
        }

        tokio::fs::create_dir_all(&inner.dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create session dir: {}", e)))?;

        // Re-uploading an index overwrites its previous bytes.
        let dest = inner.dir.join(format!("chunk-{}", chunk_index));
        move_file(&chunk.path, &dest).await?;

        inner.received.insert(chunk_index);
        inner.metadata.merge_from(metadata);
        inner.last_activity = Instant::now();

        let received = inner.received.len() as u32;
        tracing::info!(
            upload_id = %upload_id,
            chunk_index = chunk_index,
            received = received,
            total = total_chunks,
            "Chunk stored"
        );

        if received == inner.total_chunks {
            // Single transition point: only this caller gets the ticket.
            inner.state = SessionState::Assembling;
            drop(inner);
            Ok(ChunkOutcome::Complete(AssemblyTicket {
                upload_id,
                session,
            }))
        } else {
            Ok(ChunkOutcome::Progress(SessionProgress {
                received_chunks: received,
                total_chunks,
            }))
        }
    }

    /// Concatenate the session's chunks in strict index order into one file
    /// under `dest_dir`. A missing index here is a contract violation and
    /// fails loudly instead of silently truncating.
    pub async fn assemble(
        &self,
        ticket: AssemblyTicket,
        dest_dir: &Path,
    ) -> Result<AssembledUpload, AppError> {
        let mut inner = ticket.session.lock().await;

        if inner.state != SessionState::Assembling {
            return Err(AppError::Internal(format!(
                "Assembly ticket for upload {} in unexpected state",
                ticket.upload_id
            )));
        }

        let out_path = dest_dir.join(format!("{}-combined", ticket.upload_id));
        let result = concat_chunks(&inner.dir, inner.total_chunks, &out_path).await;

        match result {
            Ok(total_bytes) => {
                inner.state = SessionState::Done;
                let metadata = inner.metadata.clone();
                purge_dir(&inner.dir).await;
                drop(inner);
                self.remove_session(&ticket.upload_id).await;

                tracing::info!(
                    upload_id = %ticket.upload_id,
                    total_bytes = total_bytes,
                    "Chunked upload assembled"
                );

                Ok(AssembledUpload {
                    path: out_path,
                    metadata,
                    total_bytes,
                })
            }
            Err(e) => {
                inner.state = SessionState::Failed;
                purge_dir(&inner.dir).await;
                drop(inner);
                self.remove_session(&ticket.upload_id).await;

                // Partial output lives in the request staging dir and is
                // removed with it.
                tracing::error!(
                    upload_id = %ticket.upload_id,
                    error = %e,
                    "Chunk assembly failed"
                );
                Err(e)
            }
        }
    }

    /// Purge sessions idle longer than `ttl`. Returns how many were reaped.
    pub async fn reap_stale(&self, ttl: Duration) -> usize {
        let mut expired = Vec::new();
        {
            let sessions = self.sessions.lock().await;
            for (upload_id, session) in sessions.iter() {
                // A locked session is mid-request; skip it this sweep.
                let Ok(mut inner) = session.try_lock() else {
                    continue;
                };
                if inner.state == SessionState::Open && inner.last_activity.elapsed() > ttl {
                    inner.state = SessionState::Failed;
                    expired.push((upload_id.clone(), inner.dir.clone()));
                }
            }
        }

        for (upload_id, dir) in &expired {
            purge_dir(dir).await;
            self.remove_session(upload_id).await;
            tracing::info!(upload_id = %upload_id, "Reaped stale upload session");
        }

        expired.len()
    }

    /// Number of live sessions (for sweeps and tests).
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn remove_session(&self, upload_id: &str) {
        self.sessions.lock().await.remove(upload_id);
    }
}

async fn concat_chunks(
    session_dir: &Path,
    total_chunks: u32,
    out_path: &Path,
) -> Result<u64, AppError> {
    let mut out = tokio::fs::File::create(out_path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create output file: {}", e)))?;

    let mut total_bytes: u64 = 0;
    for index in 0..total_chunks {
        let chunk_path = session_dir.join(format!("chunk-{}", index));
        let mut chunk = tokio::fs::File::open(&chunk_path).await.map_err(|e| {
            AppError::Internal(format!("Missing chunk {} during assembly: {}", index, e))
        })?;
        total_bytes += tokio::io::copy(&mut chunk, &mut out).await.map_err(|e| {
            AppError::Internal(format!("Failed to append chunk {}: {}", index, e))
        })?;
    }

    out.flush()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to flush output file: {}", e)))?;

    Ok(total_bytes)
}

async fn move_file(from: &Path, to: &Path) -> Result<(), AppError> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    // Rename can fail across filesystems; fall back to copy + remove.
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store chunk: {}", e)))?;
    let _ = tokio::fs::remove_file(from).await;
    Ok(())
}

async fn purge_dir(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to purge session dir");
        }
    }
}
