//! Durable title store.
//!
//! A single pretty-printed JSON object mapping video id to its enrichment
//! result. The store performs no merging; callers hold the full map in memory
//! and every save rewrites the whole file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

use crate::domain::EnrichmentResult;

/// In-memory form of the store
pub type TitleMap = BTreeMap<String, EnrichmentResult>;

/// File-backed id -> result mapping
pub struct TitleStore {
    /// Path to the titles JSON file
    path: PathBuf,
}

impl TitleStore {
    /// Create a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all stored results; empty when the file does not exist yet
    pub async fn load(&self) -> Result<TitleMap> {
        if !self.path.exists() {
            return Ok(TitleMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read title store: {}", self.path.display()))?;

        if content.trim().is_empty() {
            return Ok(TitleMap::new());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse title store: {}", self.path.display()))
    }

    /// Overwrite the store with the given map
    pub async fn save(&self, titles: &TitleMap) -> Result<()> {
        let content = serde_json::to_string_pretty(titles).context("Failed to serialize titles")?;
        write_atomic(&self.path, &content).await
    }
}

/// Replace `path` with `content` via a sibling temp file and a rename,
/// creating the parent directory if needed.
pub(crate) async fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, format!("{}\n", content))
        .await
        .with_context(|| format!("Failed to write: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to replace: {}", path.display()))?;

    Ok(())
}
