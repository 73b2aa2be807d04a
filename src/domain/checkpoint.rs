//! Durable resume state for the backfill traversal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::Cursor;

/// Where the traversal stands and how much it has enriched so far.
///
/// `cursor = None` means "start from the first page" unless `complete` is
/// set, in which case the previous traversal reached the end of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Cursor of the page boundary last consumed
    #[serde(alias = "next_page_token")]
    pub cursor: Option<Cursor>,

    /// Running total of successfully enriched items
    pub processed_count: u64,

    /// Set once a traversal has reached the last page
    #[serde(default)]
    pub complete: bool,

    /// When this checkpoint was written
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::fresh()
    }
}

impl Checkpoint {
    /// State before any page has been fetched
    pub fn fresh() -> Self {
        Self {
            cursor: None,
            processed_count: 0,
            complete: false,
            updated_at: None,
        }
    }

    /// Mid-traversal position
    pub fn at(cursor: Option<Cursor>, processed_count: u64) -> Self {
        Self {
            cursor,
            processed_count,
            complete: false,
            updated_at: Some(Utc::now()),
        }
    }

    /// Traversal reached the end of the catalog
    pub fn finished(processed_count: u64) -> Self {
        Self {
            cursor: None,
            processed_count,
            complete: true,
            updated_at: Some(Utc::now()),
        }
    }

    /// True when nothing has been processed and no cursor is held
    pub fn is_fresh(&self) -> bool {
        self.cursor.is_none() && self.processed_count == 0 && !self.complete
    }
}
