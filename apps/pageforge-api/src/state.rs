//! Application state for the PageForge API

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::store::ResultStore;

const DEFAULT_RESULT_TTL_SECS: u64 = 900;

pub struct AppState {
    pub store: ResultStore,
}

impl AppState {
    pub fn new() -> Result<Self> {
        let data_dir = std::env::var("PAGEFORGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("pageforge-api"));
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;

        let ttl_secs = std::env::var("PAGEFORGE_RESULT_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RESULT_TTL_SECS);

        tracing::info!(
            "Result store at {} (TTL {}s)",
            data_dir.display(),
            ttl_secs
        );

        Ok(Self {
            store: ResultStore::new(data_dir, Duration::from_secs(ttl_secs)),
        })
    }
}
