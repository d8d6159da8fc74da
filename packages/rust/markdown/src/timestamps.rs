//! Utterance marker standardization.
//!
//! Two decades of transcript archives use at least four distinct layouts for
//! the line that opens an utterance:
//!
//! 1. `0:08:43 - Speaker` (timestamp first, dialogue on the next line)
//! 2. `Speaker [0:08:43]: dialogue`
//! 3. `Speaker (0:08:43): dialogue`
//! 4. `(0:08:43): dialogue`
//!
//! [`standardize`] rewrites every such line into the single canonical form
//! `EP:<n> Date:<key> TS:<timestamp>[ - <speaker>] <text>`, pulling the
//! dialogue up from the following line when the marker line carries none.
//! Lines that match no layout pass through untouched.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

// Marker layouts, tried in order; first match wins. The order resolves
// ambiguity between overlapping shapes (a leading timestamp must win over
// the parenthesized forms).
static TS_LEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+:\d+(?::\d+)?)\s*(?:-\s*)?(.*)").expect("valid regex"));
static TS_BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\[(\d+:\d+(?::\d+)?)\]\s*(.*)").expect("valid regex"));
static TS_PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s*\((\d+:\d+(?::\d+)?)\)\s*:?\s*(.*)").expect("valid regex")
});
static TS_BARE_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\((\d+:\d+(?::\d+)?)\)\s*:?\s*(.*)").expect("valid regex"));

// Looser test used only to decide merge eligibility of the line after a
// bare marker. Deliberately wider than the cascade above: anything that
// even resembles a new marker suppresses the merge.
static MARKER_AHEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+:\d+|.+?\s*\[\d+:\d+|\(\d+:\d+|.+?\s*\(\d+:\d+)").expect("valid regex")
});

/// Result of testing one line against the marker cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MarkerMatch {
    /// Not an utterance marker; the line passes through untouched.
    NoMatch,
    /// Marker carrying its utterance text on the same line.
    WithText {
        timestamp: String,
        speaker: Option<String>,
        text: String,
    },
    /// Marker whose utterance text, if any, is on the following line.
    NeedsLookahead {
        timestamp: String,
        speaker: Option<String>,
    },
}

/// Rewrite every utterance marker in a sanitized transcript body into the
/// canonical tagged form, absorbing plain continuation lines.
///
/// The scan is a single forward pass with one line of lookahead: a marker
/// line with no inline text consumes the next line as its dialogue, unless
/// that line is blank or itself resembles a marker. A consumed line is never
/// evaluated again.
pub fn standardize(text: &str, episode: u32, date_key: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut rewritten = 0usize;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if line.is_empty() {
            out.push(String::new());
            i += 1;
            continue;
        }

        match match_marker(line) {
            MarkerMatch::NoMatch => out.push(line.to_string()),
            MarkerMatch::WithText {
                timestamp,
                speaker,
                text,
            } => {
                let prefix = tag_prefix(episode, date_key, &timestamp, speaker.as_deref());
                out.push(format!("{prefix} {text}"));
                rewritten += 1;
            }
            MarkerMatch::NeedsLookahead { timestamp, speaker } => {
                let prefix = tag_prefix(episode, date_key, &timestamp, speaker.as_deref());
                let next = lines.get(i + 1).map(|next| next.trim()).unwrap_or("");

                if !next.is_empty() && !MARKER_AHEAD.is_match(next) {
                    out.push(format!("{prefix} {next}"));
                    i += 1; // continuation consumed
                } else {
                    out.push(prefix);
                }
                rewritten += 1;
            }
        }
        i += 1;
    }

    debug!(episode, lines = lines.len(), rewritten, "markers standardized");
    out.join("\n").trim().to_string()
}

/// Try each marker layout in cascade order against one line.
fn match_marker(line: &str) -> MarkerMatch {
    if let Some(caps) = TS_LEADING.captures(line) {
        // Leading-timestamp lines name the speaker after the dash; their
        // dialogue sits on the following line.
        let rest = caps[2].trim();
        return MarkerMatch::NeedsLookahead {
            timestamp: caps[1].to_string(),
            speaker: (!rest.is_empty()).then(|| rest.to_string()),
        };
    }
    if let Some(caps) = TS_BRACKETED.captures(line) {
        return classify(&caps[2], Some(&caps[1]), &caps[3]);
    }
    if let Some(caps) = TS_PARENTHESIZED.captures(line) {
        return classify(&caps[2], Some(&caps[1]), &caps[3]);
    }
    if let Some(caps) = TS_BARE_PAREN.captures(line) {
        return classify(&caps[1], None, &caps[2]);
    }
    MarkerMatch::NoMatch
}

fn classify(timestamp: &str, speaker: Option<&str>, text: &str) -> MarkerMatch {
    let timestamp = timestamp.trim().to_string();
    let speaker = speaker.map(|s| s.trim().to_string());
    let text = strip_colon_residue(text);

    if text.is_empty() {
        MarkerMatch::NeedsLookahead { timestamp, speaker }
    } else {
        MarkerMatch::WithText {
            timestamp,
            speaker,
            text,
        }
    }
}

/// Capturing the text after a speaker name can leave a stray `": "` from the
/// source layout; strip it from the text group only.
fn strip_colon_residue(text: &str) -> String {
    text.trim().trim_start_matches(':').trim_start().to_string()
}

fn tag_prefix(episode: u32, date_key: &str, timestamp: &str, speaker: Option<&str>) -> String {
    match speaker {
        Some(speaker) => format!("EP:{episode} Date:{date_key} TS:{timestamp} - {speaker}"),
        None => format!("EP:{episode} Date:{date_key} TS:{timestamp} -"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> String {
        standardize(&lines.join("\n"), 801, "25-05-21")
    }

    #[test]
    fn leading_timestamp_merges_next_line() {
        let out = run(&["0:00:52 - Leo Laporte", "Hello"]);
        assert_eq!(out, "EP:801 Date:25-05-21 TS:0:00:52 - Leo Laporte Hello");
    }

    #[test]
    fn bracketed_speaker_merges_next_line() {
        let out = run(&["Leo Laporte [0:00:52]:", "Hello"]);
        assert_eq!(out, "EP:801 Date:25-05-21 TS:0:00:52 - Leo Laporte Hello");
    }

    #[test]
    fn parenthesized_speaker_merges_next_line() {
        let out = run(&["Leo Laporte (0:00:52):", "Hello"]);
        assert_eq!(out, "EP:801 Date:25-05-21 TS:0:00:52 - Leo Laporte Hello");
    }

    #[test]
    fn bare_parenthesized_merges_next_line() {
        let out = run(&["(0:00:52):", "Hello"]);
        assert_eq!(out, "EP:801 Date:25-05-21 TS:0:00:52 - Hello");
    }

    #[test]
    fn inline_text_needs_no_merge() {
        let out = run(&["(0:00:52): Hello"]);
        assert_eq!(out, "EP:801 Date:25-05-21 TS:0:00:52 - Hello");

        let out = run(&["Leo Laporte [0:00:52]: Hello there"]);
        assert_eq!(out, "EP:801 Date:25-05-21 TS:0:00:52 - Leo Laporte Hello there");
    }

    #[test]
    fn no_residual_colon_after_speaker_capture() {
        let out = run(&["Steve Gibson [1:02:03]:", "Right."]);
        assert!(out.contains("TS:1:02:03 - Steve Gibson Right."));
        assert!(!out.contains("Gibson :"));
        assert!(!out.contains(": Right."));
    }

    #[test]
    fn merge_suppressed_when_next_line_is_a_marker() {
        let out = run(&["0:00:52 - Leo Laporte", "0:01:10 - Steve Gibson", "Hi Leo."]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "EP:801 Date:25-05-21 TS:0:00:52 - Leo Laporte",
                "EP:801 Date:25-05-21 TS:0:01:10 - Steve Gibson Hi Leo.",
            ]
        );
    }

    #[test]
    fn marker_at_end_of_input_emits_bare_prefix() {
        let out = run(&["Some intro text", "0:59:01 -"]);
        assert_eq!(out, "Some intro text\nEP:801 Date:25-05-21 TS:0:59:01 -");
    }

    #[test]
    fn blank_line_blocks_the_merge() {
        let out = run(&["(0:00:52):", "", "Hello"]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec!["EP:801 Date:25-05-21 TS:0:00:52 -", "", "Hello"]
        );
    }

    #[test]
    fn non_marker_lines_pass_through_verbatim() {
        let out = run(&["# Some Heading", "Plain caption text.", "* bullet"]);
        assert_eq!(out, "# Some Heading\nPlain caption text.\n* bullet");
    }

    #[test]
    fn short_timestamps_without_seconds_match() {
        let out = run(&["4:30 - Mikah Sargent", "Welcome back."]);
        assert_eq!(
            out,
            "EP:801 Date:25-05-21 TS:4:30 - Mikah Sargent Welcome back."
        );
    }

    #[test]
    fn digit_leading_prose_is_still_merge_eligible() {
        // "2024 was..." starts with digits but has no H:MM head, so it is a
        // continuation line, not a marker.
        let out = run(&["(0:00:52):", "2024 was a big year."]);
        assert_eq!(
            out,
            "EP:801 Date:25-05-21 TS:0:00:52 - 2024 was a big year."
        );
    }

    #[test]
    fn consumed_continuation_is_not_revisited() {
        let out = run(&["(0:00:52):", "Hello", "And more."]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec!["EP:801 Date:25-05-21 TS:0:00:52 - Hello", "And more."]
        );
    }

    #[test]
    fn hour_long_timestamps_survive() {
        let out = run(&["1:02:03 - Leo Laporte", "Deep into the show."]);
        assert!(out.starts_with("EP:801 Date:25-05-21 TS:1:02:03 - Leo Laporte Deep"));
    }
}
