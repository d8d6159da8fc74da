//! Transcript list-page parsing.

use std::sync::LazyLock;

use regex::Regex;

/// One transcript entry on a list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Site-relative path to the transcript page.
    pub href: String,
    /// Entry title, e.g. `"Intelligent Machines 801 Transcript"`.
    pub title: String,
}

/// Extract transcript entries from a list page.
///
/// Only site-relative hrefs are accepted; an absolute URL in an entry would
/// let a list page redirect downloads off-site.
pub fn extract_items(html: &str) -> Vec<ListItem> {
    static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?s)<div class="item summary">.*?<h2 class="title"><a href="([^"]+)">([^<]+)</a></h2>"#)
            .expect("valid regex")
    });

    ITEM_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let href = caps[1].to_string();
            if !href.starts_with('/') {
                return None;
            }
            Some(ListItem {
                href,
                title: caps[2].trim().to_string(),
            })
        })
        .collect()
}

/// First run of digits in an entry title — the episode number.
pub fn episode_number(title: &str) -> Option<&str> {
    static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

    NUMBER_RE.find(title).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_PAGE: &str = r#"
        <div class="item summary">
            <h2 class="title"><a href="/posts/transcripts/im-801">Intelligent Machines 801</a></h2>
        </div>
        <div class="item summary">
            <h2 class="title"><a href="https://evil.example/t">Security Now 999</a></h2>
        </div>
        <div class="item summary">
            <h2 class="title"><a href="/posts/transcripts/twig-750"> This Week in Google 750 </a></h2>
        </div>
    "#;

    #[test]
    fn extracts_relative_items_only() {
        let items = extract_items(LIST_PAGE);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].href, "/posts/transcripts/im-801");
        assert_eq!(items[0].title, "Intelligent Machines 801");
        // The absolute URL entry is dropped entirely.
        assert!(items.iter().all(|i| i.href.starts_with('/')));
    }

    #[test]
    fn titles_are_trimmed() {
        let items = extract_items(LIST_PAGE);
        assert_eq!(items[1].title, "This Week in Google 750");
    }

    #[test]
    fn empty_page_yields_no_items() {
        assert!(extract_items("<html><body>nothing here</body></html>").is_empty());
    }

    #[test]
    fn episode_number_from_title() {
        assert_eq!(episode_number("Intelligent Machines 801"), Some("801"));
        assert_eq!(episode_number("Security Now 999 Transcript"), Some("999"));
        assert_eq!(episode_number("No Numbers Here"), None);
    }
}
