//! Ephemeral result store.
//!
//! Large outputs are written once under a UUID and fetched by a later
//! download call. Entries expire after a TTL; a background sweeper deletes
//! whatever the read path has not already cleaned up.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use pageforge_core::PackagedOutput;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub struct ResultStore {
    root: PathBuf,
    ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredMeta {
    content_type: String,
    filename: String,
    created_secs: u64,
}

/// A retrieved entry, ready to serve.
pub struct StoredResult {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

impl ResultStore {
    pub fn new(root: PathBuf, ttl: Duration) -> Self {
        Self { root, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Persist one output; returns the id used to fetch it back.
    pub async fn put(&self, output: &PackagedOutput) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let meta = StoredMeta {
            content_type: output.content_type.to_string(),
            filename: output.filename.clone(),
            created_secs: now_secs(),
        };

        let (data_path, meta_path) = self.paths(&id);
        // Metadata first: a data blob without metadata is invisible to the
        // read path, so it must never be the half that survives a failure.
        tokio::fs::write(&meta_path, serde_json::to_vec(&meta)?)
            .await
            .with_context(|| format!("writing result metadata {}", meta_path.display()))?;
        tokio::fs::write(&data_path, &output.bytes)
            .await
            .with_context(|| format!("writing result data {}", data_path.display()))?;

        tracing::info!("Stored result {} ({} bytes)", id, output.bytes.len());
        Ok(id)
    }

    /// Fetch an entry by id. Returns `None` for unknown, malformed, or
    /// expired ids; expired entries are deleted on the way out.
    pub async fn get(&self, id: &str) -> Result<Option<StoredResult>> {
        // Non-UUID ids never touch the filesystem.
        if Uuid::parse_str(id).is_err() {
            return Ok(None);
        }

        let (data_path, meta_path) = self.paths(id);
        let meta_bytes = match tokio::fs::read(&meta_path).await {
            Ok(bytes) => bytes,
            Err(_) => return Ok(None),
        };
        let meta: StoredMeta = match serde_json::from_slice(&meta_bytes) {
            Ok(meta) => meta,
            Err(_) => return Ok(None),
        };

        if now_secs().saturating_sub(meta.created_secs) > self.ttl.as_secs() {
            let _ = tokio::fs::remove_file(&data_path).await;
            let _ = tokio::fs::remove_file(&meta_path).await;
            return Ok(None);
        }

        let bytes = match tokio::fs::read(&data_path).await {
            Ok(bytes) => bytes,
            Err(_) => return Ok(None),
        };
        Ok(Some(StoredResult {
            bytes,
            content_type: meta.content_type,
            filename: meta.filename,
        }))
    }

    /// Delete every expired entry; returns how many were evicted.
    pub async fn sweep(&self) -> Result<usize> {
        let mut evicted = 0;
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .with_context(|| format!("reading store directory {}", self.root.display()))?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let extension = path.extension().and_then(|e| e.to_str());
            if extension == Some("bin") {
                // A data blob with no metadata sidecar is unreachable.
                let has_meta = tokio::fs::try_exists(path.with_extension("json"))
                    .await
                    .unwrap_or(false);
                if !has_meta && tokio::fs::remove_file(&path).await.is_ok() {
                    evicted += 1;
                }
                continue;
            }
            if extension != Some("json") {
                continue;
            }
            let expired = match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<StoredMeta>(&bytes) {
                    Ok(meta) => {
                        now_secs().saturating_sub(meta.created_secs) > self.ttl.as_secs()
                    }
                    // Unreadable metadata is treated as garbage.
                    Err(_) => true,
                },
                Err(_) => continue,
            };
            if expired {
                let _ = tokio::fs::remove_file(path.with_extension("bin")).await;
                let _ = tokio::fs::remove_file(&path).await;
                evicted += 1;
            }
        }
        Ok(evicted)
    }

    fn paths(&self, id: &str) -> (PathBuf, PathBuf) {
        (
            self.root.join(format!("{}.bin", id)),
            self.root.join(format!("{}.json", id)),
        )
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
