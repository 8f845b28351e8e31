//! URL extraction from terminal transcripts.
//!
//! Purely lexical: no percent-decoding and no check that a host exists.

use indexmap::IndexSet;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// A URL starts at the beginning of a line or after a non-word character,
    /// with a scheme (`http`, `https`, `ftp`, `ftps`) or a bare `www.`.
    static ref URL_PATTERN: Regex = Regex::new(concat!(
        r"(?ims)(?:^|[^A-Za-z0-9_])",
        r"(?P<url>(?:(?:ht|f)tps?://|www\.)",
        r"(?:[A-Za-z0-9_\-]+\.)+?(?:[A-Za-z0-9_\-.~]+/?)*",
        r"[A-Za-z0-9.,%_=?&#\-+()\[\]*$~@!:/{};']*)",
    ))
    .unwrap();
}

/// Scans text for URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlScanner;

impl UrlScanner {
    /// Distinct URLs in first-occurrence order.
    pub fn scan(text: &str) -> IndexSet<String> {
        URL_PATTERN
            .captures_iter(text)
            .filter_map(|caps| caps.name("url"))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Distinct URLs, most recent first, as offered for selection.
    pub fn most_recent_first(text: &str) -> Vec<String> {
        Self::scan(text).into_iter().rev().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "see http://a.com and www.b.org/x?y=1 then http://a.com again";

    #[test]
    fn test_first_occurrence_order_and_dedup() {
        let urls: Vec<_> = UrlScanner::scan(SAMPLE).into_iter().collect();
        assert_eq!(urls, vec!["http://a.com", "www.b.org/x?y=1"]);
    }

    #[test]
    fn test_most_recent_first() {
        assert_eq!(
            UrlScanner::most_recent_first(SAMPLE),
            vec!["www.b.org/x?y=1", "http://a.com"]
        );
    }

    #[test]
    fn test_schemes() {
        let text = "ftp://files.example.net/pub ftps://x.example.io https://secure.example.com/a#b";
        let urls: Vec<_> = UrlScanner::scan(text).into_iter().collect();
        assert_eq!(
            urls,
            vec![
                "ftp://files.example.net/pub",
                "ftps://x.example.io",
                "https://secure.example.com/a#b"
            ]
        );
    }

    #[test]
    fn test_case_insensitive() {
        let urls: Vec<_> = UrlScanner::scan("open HTTP://EXAMPLE.COM/Path").into_iter().collect();
        assert_eq!(urls, vec!["HTTP://EXAMPLE.COM/Path"]);
    }

    #[test]
    fn test_requires_boundary() {
        assert!(UrlScanner::scan("xhttp://a.com").is_empty());
        assert!(UrlScanner::scan("awww.example.com").is_empty());
        let urls: Vec<_> = UrlScanner::scan("(http://a.com)").into_iter().collect();
        assert_eq!(urls, vec!["http://a.com)"]);
    }

    #[test]
    fn test_line_starts() {
        let text = "first line\nwww.one.com\nhttp://two.org/path\n";
        let urls: Vec<_> = UrlScanner::scan(text).into_iter().collect();
        assert_eq!(urls, vec!["www.one.com", "http://two.org/path"]);
    }

    #[test]
    fn test_needs_a_host_label() {
        assert!(UrlScanner::scan("http://localhost").is_empty());
        assert!(UrlScanner::scan("plain text only").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let text = "a http://x.io b www.y.com c http://z.net/q?r=1 d http://x.io";
        let first = UrlScanner::most_recent_first(text);
        for _ in 0..10 {
            assert_eq!(UrlScanner::most_recent_first(text), first);
        }
    }
}
