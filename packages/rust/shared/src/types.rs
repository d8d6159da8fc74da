//! Core domain types for transcript processing.

/// Metadata extracted from one transcript document.
///
/// Extraction never fails: each field falls back to a documented default
/// when the corresponding element is missing or unparseable, so a malformed
/// document still flows through the pipeline as a degraded record rather
/// than aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeMetadata {
    /// Episode number, taken from the source filename.
    pub number: u32,
    /// Episode title (`"Unknown Episode"` when absent).
    pub title: String,
    /// Human-readable byline date with whitespace collapsed
    /// (`"Unknown Date"` when absent).
    pub date_text: String,
    /// Sortable `YY-MM-DD` key derived from the byline
    /// (`"00-01-01"` when the byline cannot be parsed).
    pub date_key: String,
    /// Calendar year from the byline, `None` when no four-digit year appears.
    pub year: Option<i32>,
}

impl EpisodeMetadata {
    /// Title used when the document carries no recognizable title element.
    pub const UNKNOWN_TITLE: &'static str = "Unknown Episode";
    /// Byline used when the document carries no recognizable date element.
    pub const UNKNOWN_DATE: &'static str = "Unknown Date";
    /// Date key used when the byline cannot be parsed into a real date.
    pub const FALLBACK_DATE_KEY: &'static str = "00-01-01";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_date_key_sorts_before_real_dates() {
        // Lexicographic order must match chronological order within a century,
        // and the fallback must sort first.
        assert!(EpisodeMetadata::FALLBACK_DATE_KEY < "05-01-30");
        assert!("24-12-31" < "25-01-01");
        assert!("25-05-21" < "25-11-05");
    }
}
