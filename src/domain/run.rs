//! Run state and the report produced when a backfill ends.
//!
//! A run is one invocation of the backfill, from loading state to the final
//! save.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phase of the backfill state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// Loading the store and checkpoint
    Init,

    /// Waiting on a catalog page
    FetchingPage,

    /// Enriching the items of the current page
    ProcessingItems,

    /// Persisting the store and checkpoint
    Checkpointing,

    /// Traversal finished
    Done,

    /// Persisting state after a fatal error or interrupt
    Aborting,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunOutcome {
    /// Reached the end of the catalog
    Completed,

    /// Operator asked to stop; state was saved
    Interrupted,

    /// Fatal upstream or persistence error; state was saved where possible
    Failed { error: String },
}

impl RunOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed | Self::Interrupted => 0,
            Self::Failed { .. } => 1,
        }
    }
}

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Catalog pages fetched
    pub pages: u64,

    /// Items enriched during this run
    pub enriched: u64,

    /// Items already present in the store
    pub already_stored: u64,

    /// Items dropped by the content filter
    pub filtered: u64,

    /// Items whose generation failed
    pub failed: u64,
}

/// Summary returned by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Identifier of this run (log correlation only)
    pub run_id: Uuid,

    /// How the run ended
    pub outcome: RunOutcome,

    /// Running total recorded in the checkpoint
    pub processed_total: u64,

    /// Entries in the title store after the final save
    pub store_size: usize,

    /// Per-run counters
    pub stats: RunStats,
}

impl RunReport {
    /// Check if the run reached the end of the catalog
    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed)
    }
}
