//! Durable checkpoint file for resuming a backfill.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

use crate::domain::Checkpoint;

use super::store::write_atomic;

/// File-backed checkpoint
pub struct CheckpointStore {
    /// Path to the checkpoint JSON file
    path: PathBuf,
}

impl CheckpointStore {
    /// Create a checkpoint store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the checkpoint file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the checkpoint; a fresh one when the file does not exist yet
    pub async fn load(&self) -> Result<Checkpoint> {
        if !self.path.exists() {
            return Ok(Checkpoint::fresh());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read checkpoint: {}", self.path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse checkpoint: {}", self.path.display()))
    }

    /// Overwrite the checkpoint file
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let content =
            serde_json::to_string_pretty(checkpoint).context("Failed to serialize checkpoint")?;
        write_atomic(&self.path, &content).await
    }
}
