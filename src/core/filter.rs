//! Content filter applied to every fetched page.
//!
//! Short-form clips and platform placeholders never reach generation or the
//! store.

use tracing::debug;

use crate::domain::CatalogItem;

use super::duration::parse_duration;

/// Items at or below this length are short-form and skipped
pub const SHORT_FORM_THRESHOLD_SECS: u64 = 60;

/// Titles the platform substitutes for removed or hidden uploads
const PLACEHOLDER_TITLES: [&str; 2] = ["Deleted video", "Private video"];

/// Result of filtering one page
#[derive(Debug, Clone, Default)]
pub struct FilteredPage {
    /// Items eligible for enrichment, in page order
    pub kept: Vec<CatalogItem>,

    /// Number of items dropped
    pub dropped: usize,
}

/// Whether a single item should be enriched
pub fn is_eligible(item: &CatalogItem) -> bool {
    if PLACEHOLDER_TITLES.contains(&item.title.as_str()) {
        debug!(video_id = %item.id, title = %item.title, "Skipping unavailable video");
        return false;
    }

    let seconds = parse_duration(&item.raw_duration);
    if seconds <= SHORT_FORM_THRESHOLD_SECS {
        debug!(
            video_id = %item.id,
            duration = %item.raw_duration,
            seconds,
            "Skipping short-form video"
        );
        return false;
    }

    true
}

/// Keep only the items that should be enriched
pub fn filter_page(items: Vec<CatalogItem>) -> FilteredPage {
    let total = items.len();
    let kept: Vec<CatalogItem> = items.into_iter().filter(is_eligible).collect();

    FilteredPage {
        dropped: total - kept.len(),
        kept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, title: &str, duration: &str) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            published_at: None,
            raw_duration: duration.to_string(),
        }
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(!is_eligible(&item("a", "Clip", "PT1M0S")));
        assert!(is_eligible(&item("b", "Video", "PT1M1S")));
    }

    #[test]
    fn test_zero_and_unparsable_excluded() {
        assert!(!is_eligible(&item("a", "Zero", "PT0S")));
        assert!(!is_eligible(&item("b", "Garbage", "three minutes")));
        assert!(!is_eligible(&item("c", "Missing", "")));
    }

    #[test]
    fn test_placeholders_excluded() {
        assert!(!is_eligible(&item("a", "Deleted video", "PT20M")));
        assert!(!is_eligible(&item("b", "Private video", "PT20M")));
    }

    #[test]
    fn test_filter_page_keeps_order() {
        let page = vec![
            item("1", "Short", "PT30S"),
            item("2", "Long", "PT2M"),
            item("3", "Medium", "PT1M30S"),
        ];

        let filtered = filter_page(page);
        let ids: Vec<&str> = filtered.kept.iter().map(|i| i.id.as_str()).collect();

        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(filtered.dropped, 1);
    }
}
