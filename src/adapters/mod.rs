//! Adapter interfaces for external systems.
//!
//! The backfill talks to three services: the catalog listing API, the
//! transcript service and the generative model. Each sits behind a trait so
//! the orchestrator can be driven by in-memory fakes.

pub mod anthropic;
pub mod transcript;
pub mod youtube;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CatalogPage, Cursor};

pub use anthropic::AnthropicModel;
pub use transcript::{truncate_words, ProxyCredentials, YouTubeTranscripts};
pub use youtube::YouTubeCatalog;

/// Errors from the catalog listing API. All of them are fatal to a run.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Catalog API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),
}

/// Errors from the generative model API. Contained to the item being enriched.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Model API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Model response contained no text")]
    EmptyResponse,
}

/// Paged access to the catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Fetch one page. `None` requests the first page.
    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<CatalogPage, CatalogError>;
}

/// Auxiliary transcript text for an item
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Transcript text, already truncated, or `None` when unavailable for any reason
    async fn fetch(&self, video_id: &str) -> Option<String>;
}

/// Single-turn text generation
#[async_trait]
pub trait TitleModel: Send + Sync {
    /// Human-readable model name
    fn name(&self) -> &str;

    /// Send a system instruction and one user message, return the reply text
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError>;
}
