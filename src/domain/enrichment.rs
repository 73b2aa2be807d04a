//! Generated titles and the records persisted for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A validated `{tag, title}` pair produced by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub tag: String,
    pub title: String,
}

impl ParsedTitle {
    /// Display form stored alongside the raw parts: `[tag] title`
    pub fn clean_title(&self) -> String {
        format!("[{}] {}", self.tag, self.title)
    }
}

/// The durable record written once per successfully enriched item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    /// Display title, `[tag] title`
    pub clean_title: String,

    /// Category tag chosen by the model
    pub tag: String,

    /// Title as it was published
    pub original_title: String,

    /// When the title was generated
    pub generated_at: DateTime<Utc>,
}

impl EnrichmentResult {
    /// Build a record from a parsed model response
    pub fn new(parsed: &ParsedTitle, original_title: impl Into<String>) -> Self {
        Self {
            clean_title: parsed.clean_title(),
            tag: parsed.tag.clone(),
            original_title: original_title.into(),
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_format() {
        let parsed = ParsedTitle {
            tag: "Opening".to_string(),
            title: "King's Gambit Explained".to_string(),
        };
        let result = EnrichmentResult::new(&parsed, "I PLAYED THE KING'S GAMBIT!!!");

        assert_eq!(result.clean_title, "[Opening] King's Gambit Explained");
        assert_eq!(result.tag, "Opening");
        assert_eq!(result.original_title, "I PLAYED THE KING'S GAMBIT!!!");
    }

    #[test]
    fn test_reads_existing_store_entry() {
        let json = r#"{
            "clean_title": "[Game Review] Carlsen vs Nakamura",
            "tag": "Game Review",
            "original_title": "INSANE GAME",
            "generated_at": "2024-05-01T12:30:00.123456+00:00"
        }"#;

        let result: EnrichmentResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.tag, "Game Review");
        assert_eq!(result.generated_at.to_rfc3339().get(..10), Some("2024-05-01"));
    }
}
