//! Registry of known shows and their file prefixes.
//!
//! List-page entry titles carry the show name (`"This Week in Tech 1042"`),
//! while files on disk are keyed by a short prefix (`TWIT_1042.html`). This
//! module owns the mapping between the two.

/// Lowercase show-title fragment → file prefix.
///
/// Matching is by substring on the lowercased entry title, so the fragments
/// must be distinctive enough not to collide across shows.
pub const SHOW_MAP: &[(&str, &str)] = &[
    ("intelligent machines", "IM"),
    ("this week in google", "TWIG"),
    ("windows weekly", "WW"),
    ("macbreak weekly", "MBW"),
    ("this week in tech", "TWIT"),
    ("security now", "SN"),
    ("this week in space", "TWIS"),
    ("tech news weekly", "TNW"),
    ("untitled linux show", "ULS"),
    ("hands-on tech", "HOT"),
    ("hands-on windows", "HOW"),
    ("hands-on apple", "HOA"),
    ("know how", "KH"),
    ("before you buy", "BYB"),
    ("ios today", "IOS"),
    ("all about android", "AAA"),
    ("floss weekly", "FLOSS"),
    ("ham nation", "HAM"),
];

/// Match a list-page entry title to a show prefix, if any show name
/// appears in it.
pub fn prefix_for_title(title: &str) -> Option<&'static str> {
    let lower = title.to_lowercase();
    SHOW_MAP
        .iter()
        .find(|(name, _)| lower.contains(name))
        .map(|(_, prefix)| *prefix)
}

/// Resolve a user-supplied selector — either a prefix code (`"twit"`,
/// `"SN"`) or a full show name (`"security now"`) — to its prefix.
pub fn resolve_show(arg: &str) -> Option<&'static str> {
    let upper = arg.trim().to_uppercase();
    if let Some((_, prefix)) = SHOW_MAP.iter().find(|(_, p)| *p == upper) {
        return Some(prefix);
    }

    let lower = arg.trim().to_lowercase();
    SHOW_MAP
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, prefix)| *prefix)
}

/// All known prefixes, in registry order.
pub fn all_prefixes() -> Vec<&'static str> {
    SHOW_MAP.iter().map(|(_, p)| *p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_matching_is_case_insensitive() {
        assert_eq!(
            prefix_for_title("This Week in Tech 1042 Transcript"),
            Some("TWIT")
        );
        assert_eq!(prefix_for_title("SECURITY NOW 999"), Some("SN"));
        assert_eq!(prefix_for_title("Some Other Podcast 12"), None);
    }

    #[test]
    fn resolve_accepts_code_or_name() {
        assert_eq!(resolve_show("TWIG"), Some("TWIG"));
        assert_eq!(resolve_show("twig"), Some("TWIG"));
        assert_eq!(resolve_show("this week in google"), Some("TWIG"));
        assert_eq!(resolve_show("nonsense"), None);
    }

    #[test]
    fn all_prefixes_are_unique() {
        let mut prefixes = all_prefixes();
        prefixes.sort_unstable();
        let before = prefixes.len();
        prefixes.dedup();
        assert_eq!(prefixes.len(), before);
    }
}
