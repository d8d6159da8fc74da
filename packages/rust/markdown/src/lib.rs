//! Transcript markup cleanup and line standardization.
//!
//! [`sanitize`] converts raw transcript markup to plain text with Markdown
//! structure tokens; [`timestamps::standardize`] then rewrites utterance
//! markers into one canonical tagged shape.

pub mod timestamps;

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

/// Convert raw transcript markup to clean Markdown-flavored text.
///
/// Non-renderable blocks are dropped before any other rule fires; headings,
/// paragraphs, breaks, emphasis, links, and lists map to their Markdown
/// equivalents; every remaining tag is stripped without trace. Re-running
/// the sanitizer on its own output is a no-op.
pub fn sanitize(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }

    let mut text = strip_non_content(markup);
    text = map_headings(&text);
    text = map_paragraphs(&text);
    text = map_breaks(&text);
    text = map_emphasis(&text);
    text = sanitize_links(&text);
    text = map_lists(&text);
    text = strip_tags(&text);
    text = decode_entities(&text);
    let result = normalize_lines(&text);

    debug!(in_len = markup.len(), out_len = result.len(), "markup sanitized");
    result
}

// ---------------------------------------------------------------------------
// Pass 1: Drop non-renderable blocks
// ---------------------------------------------------------------------------

fn strip_non_content(text: &str) -> String {
    static SCRIPT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<script.*?</script>").expect("valid regex"));
    static STYLE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<style.*?</style>").expect("valid regex"));

    let text = SCRIPT_RE.replace_all(text, "");
    STYLE_RE.replace_all(&text, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Structural tags → Markdown
// ---------------------------------------------------------------------------

fn map_headings(text: &str) -> String {
    static H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<h1[^>]*>(.*?)</h1>").expect("valid regex"));
    static H2_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<h2[^>]*>(.*?)</h2>").expect("valid regex"));
    static H3_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<h3[^>]*>(.*?)</h3>").expect("valid regex"));

    let text = H1_RE.replace_all(text, "# $1\n\n");
    let text = H2_RE.replace_all(&text, "## $1\n\n");
    H3_RE.replace_all(&text, "### $1\n\n").to_string()
}

fn map_paragraphs(text: &str) -> String {
    static P_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<p[^>]*>(.*?)</p>").expect("valid regex"));

    P_RE.replace_all(text, "$1\n\n").to_string()
}

fn map_breaks(text: &str) -> String {
    static BR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));

    BR_RE.replace_all(text, "\n").to_string()
}

fn map_emphasis(text: &str) -> String {
    static B_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<b[^>]*>(.*?)</b>").expect("valid regex"));
    static STRONG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<strong[^>]*>(.*?)</strong>").expect("valid regex"));
    static I_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<i[^>]*>(.*?)</i>").expect("valid regex"));
    static EM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<em[^>]*>(.*?)</em>").expect("valid regex"));

    let text = B_RE.replace_all(text, "**$1**");
    let text = STRONG_RE.replace_all(&text, "**$1**");
    let text = I_RE.replace_all(&text, "*$1*");
    EM_RE.replace_all(&text, "*$1*").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Links, with unsafe targets dropped
// ---------------------------------------------------------------------------

/// Render anchors as `[text](target)` only for relative or http(s) targets.
///
/// Any other scheme (`javascript:`, `data:`, ...) is removed entirely and
/// only the link text survives, so unsafe URIs never reach the output corpus.
fn sanitize_links(text: &str) -> String {
    static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?s)<a\s+(?:[^>]*?\s+)?href="([^"]*)"[^>]*>(.*?)</a>"#).expect("valid regex")
    });

    ANCHOR_RE
        .replace_all(text, |caps: &Captures| {
            let target = &caps[1];
            let label = &caps[2];

            if target.starts_with('/')
                || target.starts_with("http://")
                || target.starts_with("https://")
            {
                format!("[{label}]({target})")
            } else {
                label.to_string()
            }
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Pass 4: Lists, leftover tags, entities
// ---------------------------------------------------------------------------

fn map_lists(text: &str) -> String {
    static UL_OPEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<ul[^>]*>").expect("valid regex"));
    static UL_CLOSE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)</ul>").expect("valid regex"));
    static LI_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<li[^>]*>(.*?)</li>").expect("valid regex"));

    let text = UL_OPEN_RE.replace_all(text, "");
    let text = UL_CLOSE_RE.replace_all(&text, "\n");
    LI_RE.replace_all(&text, "* $1\n").to_string()
}

fn strip_tags(text: &str) -> String {
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

    TAG_RE.replace_all(text, "").to_string()
}

/// Decode the small fixed set of named entities seen in the archives.
/// Anything else is left as-is rather than treated as a parse failure.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

// ---------------------------------------------------------------------------
// Pass 5: Line normalization
// ---------------------------------------------------------------------------

/// Trim each line and collapse runs of blank lines to a single separator.
fn normalize_lines(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        } else if lines.last().is_some_and(|prev| !prev.is_empty()) {
            lines.push(String::new());
        }
    }

    lines.join("\n").trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
