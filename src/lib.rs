//! cleantitle - Resumable title enrichment for a video catalog
//!
//! Walks a channel's uploads page by page, drops short-form and placeholder
//! entries, and asks a language model for a normalized `[Tag] Title` for
//! every item not yet enriched.
//!
//! # Durability
//!
//! Two JSON files hold all state:
//! - The title store maps video id to its enrichment result
//! - The checkpoint records the page cursor and a running total
//!
//! Both are rewritten atomically at batch and page boundaries, on fatal
//! errors and on interrupt, so a rerun picks up where the last one stopped
//! without regenerating stored items.
//!
//! # Modules
//!
//! - `adapters`: External services (YouTube Data API, captions, Anthropic)
//! - `core`: Parsing, filtering, generation, persistence and the orchestrator
//! - `domain`: Data structures (CatalogItem, Checkpoint, EnrichmentResult)
//! - `config`: Config file, environment and credentials
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run or resume the backfill
//! cleantitle backfill
//!
//! # Inspect progress
//! cleantitle status
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{CatalogSource, TitleModel, TranscriptSource};
pub use core::{BackfillOrchestrator, PipelineSettings, TitleGenerator};
pub use domain::{CatalogItem, CatalogPage, Checkpoint, Cursor, EnrichmentResult, RunOutcome, RunReport};
