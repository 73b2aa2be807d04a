//! Catalog items and the opaque pagination cursor.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque continuation token handed out by the catalog API.
///
/// Never parsed or constructed from parts; resume logic only compares
/// cursors for equality and checks presence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a token received from the catalog API
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for passing back to the API
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single catalog entry (one uploaded video)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    /// Video identity, stable across fetches
    pub id: String,

    /// Title as published
    pub title: String,

    /// Description as published
    pub description: String,

    /// When the video was published (if the API reported it)
    pub published_at: Option<DateTime<Utc>>,

    /// Compact ISO 8601 duration, e.g. `PT12M3S`
    pub raw_duration: String,
}

/// One page of catalog results
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    /// Items on this page, in API order
    pub items: Vec<CatalogItem>,

    /// Cursor for the following page; `None` when the listing is exhausted
    pub next_cursor: Option<Cursor>,
}

impl CatalogPage {
    /// True when the page carries no items and no continuation
    pub fn is_terminal(&self) -> bool {
        self.items.is_empty() && self.next_cursor.is_none()
    }
}
