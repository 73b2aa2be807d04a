//! Parsing of compact ISO 8601 durations (`PT1H2M3S`).

use std::sync::OnceLock;

use regex::Regex;

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("duration pattern is valid")
    })
}

/// Convert a `PT[nH][nM][nS]` duration into seconds.
///
/// Missing components count as zero. Input that does not have this shape
/// (including day components and overflowing numbers) yields 0.
pub fn parse_duration(raw: &str) -> u64 {
    let Some(caps) = duration_pattern().captures(raw.trim()) else {
        return 0;
    };

    let component = |idx: usize| -> Option<u64> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse::<u64>().ok(),
            None => Some(0),
        }
    };

    let total = (|| {
        let hours = component(1)?;
        let minutes = component(2)?;
        let seconds = component(3)?;
        hours
            .checked_mul(3600)?
            .checked_add(minutes.checked_mul(60)?)?
            .checked_add(seconds)
    })();

    total.unwrap_or(0)
}
