//! Per-document episode parsing and rendering.
//!
//! A transcript document carries a title element, a byline with the airing
//! date, and a body element. Any of the three may be absent in the older
//! archives; extraction falls back to documented defaults instead of
//! failing, so one malformed document never aborts a run.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use castpack_shared::EpisodeMetadata;

/// Byline layouts seen across the archives, tried in order.
/// Ordinal suffixes are stripped before parsing.
const DATE_LAYOUTS: &[&str] = &["%B %d %Y", "%b %d %Y", "%A, %B %d, %Y", "%B %d, %Y"];

/// One fully normalized episode: metadata plus the standardized body text.
#[derive(Debug, Clone)]
pub struct NormalizedEpisode {
    pub meta: EpisodeMetadata,
    pub body: String,
}

/// An episode rendered into its output block, with the derived sizes the
/// chunk assembler packs by.
#[derive(Debug, Clone)]
pub struct RenderedEpisode {
    pub number: u32,
    pub year: Option<i32>,
    pub words: usize,
    pub text: String,
}

impl NormalizedEpisode {
    /// Words in the normalized body (the heading lines are not counted).
    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }

    /// Render the fixed output block: heading, bold date line, body, and a
    /// trailing rule separating this episode from the next.
    pub fn render(&self) -> RenderedEpisode {
        let text = format!(
            "# Episode: {}\n**Date:** {}\n\n{}\n\n---\n\n",
            self.meta.title, self.meta.date_text, self.body
        );

        RenderedEpisode {
            number: self.meta.number,
            year: self.meta.year,
            words: self.word_count(),
            text,
        }
    }
}

impl RenderedEpisode {
    pub fn bytes(&self) -> usize {
        self.text.len()
    }
}

/// Parse one raw transcript document into a normalized episode.
///
/// The body is sanitized to Markdown-flavored text and every utterance
/// marker is rewritten into the canonical tagged form carrying the episode
/// number and date key.
pub fn parse_episode(html: &str, number: u32) -> NormalizedEpisode {
    let doc = Html::parse_document(html);

    let title =
        select_text(&doc, "h1.post-title").unwrap_or_else(|| EpisodeMetadata::UNKNOWN_TITLE.into());

    let date_text = select_text(&doc, "p.byline")
        .map(|raw| raw.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_else(|| EpisodeMetadata::UNKNOWN_DATE.into());

    let year = extract_year(&date_text);
    let date_key = date_key_from(&date_text);

    let body_html = select_inner_html(&doc, "div.body.textual").unwrap_or_default();
    let sanitized = castpack_markdown::sanitize(&body_html);
    let body = castpack_markdown::timestamps::standardize(&sanitized, number, &date_key);

    debug!(number, %date_key, title = %title, "episode parsed");

    NormalizedEpisode {
        meta: EpisodeMetadata {
            number,
            title,
            date_text,
            date_key,
            year,
        },
        body,
    }
}

/// Pull a four-digit year out of a byline, if one appears.
pub fn extract_year(date_text: &str) -> Option<i32> {
    static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").expect("valid regex"));

    YEAR_RE
        .find(date_text)
        .and_then(|m| m.as_str().parse().ok())
}

/// Convert a byline into the sortable `YY-MM-DD` key.
///
/// Falls back to [`EpisodeMetadata::FALLBACK_DATE_KEY`] when no known layout
/// matches, which sorts before every real date.
pub fn date_key_from(date_text: &str) -> String {
    static ORDINAL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(\d+)(?:st|nd|rd|th)").expect("valid regex"));

    if date_text.is_empty() || date_text == EpisodeMetadata::UNKNOWN_DATE {
        return EpisodeMetadata::FALLBACK_DATE_KEY.into();
    }

    let cleaned = ORDINAL_RE.replace_all(date_text, "$1");
    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned.trim(), layout) {
            return date.format("%y-%m-%d").to_string();
        }
    }

    EpisodeMetadata::FALLBACK_DATE_KEY.into()
}

fn select_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).expect("valid selector");
    doc.select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

fn select_inner_html(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).expect("valid selector");
    doc.select(&sel).next().map(|el| el.inner_html())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
