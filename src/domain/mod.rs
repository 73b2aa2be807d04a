//! Domain types for the title backfill.
//!
//! This module contains the core data structures:
//! - Item: Catalog entries and the opaque page cursor
//! - Enrichment: Parsed model output and stored results
//! - Checkpoint: Durable resume state
//! - Run: Phases, outcome and report of a backfill run

pub mod checkpoint;
pub mod enrichment;
pub mod item;
pub mod run;

// Re-export commonly used types
pub use checkpoint::Checkpoint;
pub use enrichment::{EnrichmentResult, ParsedTitle};
pub use item::{CatalogItem, CatalogPage, Cursor};
pub use run::{PipelinePhase, RunOutcome, RunReport, RunStats};
