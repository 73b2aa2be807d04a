//! Core backfill logic.
//!
//! This module contains:
//! - Duration: Compact duration parsing
//! - Filter: Short-form and placeholder filtering
//! - Generator: Prompting, retry and response parsing
//! - Store / Checkpoint: Durable state
//! - Orchestrator: The resumable traversal loop

pub mod checkpoint;
pub mod duration;
pub mod filter;
pub mod generator;
pub mod orchestrator;
pub mod retry;
pub mod store;

// Re-export commonly used types
pub use checkpoint::CheckpointStore;
pub use duration::parse_duration;
pub use filter::{filter_page, is_eligible, FilteredPage, SHORT_FORM_THRESHOLD_SECS};
pub use generator::{
    build_user_prompt, parse_title_response, GeneratorSettings, ParseFailure, TitleGenerator,
    DEFAULT_SYSTEM_PROMPT,
};
pub use orchestrator::{BackfillOrchestrator, PipelineError, PipelineSettings};
pub use retry::RetryPolicy;
pub use store::{TitleMap, TitleStore};
