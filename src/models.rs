//! Data model for crawled news articles.
//!
//! This module defines [`Article`], the central record that every source
//! adapter produces and every downstream stage (dedup, history, filters,
//! stories) consumes, along with its derived identities:
//!
//! - [`Article::dedup_key`]: exact-match identity over normalized title + URL
//! - [`Article::title_fingerprint`]: fuzzy cross-source "same story" probe
//! - [`normalize_url`]: canonical URL form with tracking params removed
//!
//! Articles are values: all "same article" relationships are computed from
//! content, never from object identity.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Query parameters stripped during URL normalization.
///
/// `utm_*` is matched by prefix; the rest are exact keys. These are
/// click-tracking decorations that vary per referrer while pointing at the
/// same resource.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "ref", "ref_src", "source", "cmpid", "igshid", "mc_cid", "mc_eid",
];

/// One unit of crawled content: a headline with metadata.
///
/// Constructed by source adapters during a crawl and alive in memory for the
/// duration of that crawl (plus optional cache/history serialization). Every
/// optional field carries a serde default so that cache entries written by an
/// older schema decode cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Headline text. Non-empty for every emitted article.
    pub title: String,
    /// Absolute URL; the canonical identity of the article.
    pub url: String,
    /// Human-readable origin label, e.g. `"Hacker News (↑231)"`.
    pub source: String,
    /// Plain-text summary, HTML stripped upstream, typically ≤300 chars.
    #[serde(default)]
    pub summary: String,
    /// Publication instant in UTC, when the upstream provides one.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Closed tag-set category (`tech`, `ai`, `world`, `science`, ...).
    #[serde(default = "default_category")]
    pub category: String,
    /// Source-assigned quality in `[0, 1]`.
    #[serde(default = "default_quality")]
    pub quality_score: f64,
    /// How many sources contribute to this article after dedup.
    #[serde(default = "default_source_count")]
    pub source_count: u32,
    /// Free-form provenance markers like `lobsters:rust`.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Author name; empty when unknown.
    #[serde(default)]
    pub author: String,
    /// Comments page distinct from `url`, when the upstream has one.
    #[serde(default)]
    pub discussion_url: Option<String>,
    /// Profile relevance in `[0, 1]`; set only by profile scoring.
    #[serde(default)]
    pub relevance: Option<f64>,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_quality() -> f64 {
    0.5
}

fn default_source_count() -> u32 {
    1
}

impl Article {
    /// Create an article with the three mandatory fields; everything else
    /// takes the schema default.
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: source.into(),
            summary: String::new(),
            timestamp: None,
            category: default_category(),
            quality_score: default_quality(),
            source_count: default_source_count(),
            tags: Vec::new(),
            author: String::new(),
            discussion_url: None,
            relevance: None,
        }
    }

    /// Exact-match deduplication key.
    ///
    /// A stable md5 over `normalize(title) + "|" + normalize_url(url)`; two
    /// articles with the same headline pointing at the same canonical URL
    /// collide here regardless of case, surrounding whitespace, or tracking
    /// query parameters.
    pub fn dedup_key(&self) -> String {
        let normalized_title = self.title.trim().to_lowercase();
        let digest = md5::compute(format!("{}|{}", normalized_title, normalize_url(&self.url)));
        format!("{digest:x}")
    }

    /// Fuzzy cross-source fingerprint over the set of significant title words.
    ///
    /// The sorted, unique, lowercased words of length > 3 are hashed so that
    /// re-ordered or lightly reworded headlines from different outlets still
    /// collide. Returns `None` when fewer than two significant words exist;
    /// such fingerprints would collapse unrelated short headlines.
    pub fn title_fingerprint(&self) -> Option<String> {
        let words = significant_words(&self.title);
        if words.len() < 2 {
            return None;
        }
        let joined = words.into_iter().collect::<Vec<_>>().join(" ");
        Some(format!("{:x}", md5::compute(joined)))
    }

    /// All persistent fingerprints for the history store: the exact key plus
    /// the title fingerprint when one exists.
    pub fn fingerprints(&self) -> Vec<String> {
        let mut fps = vec![self.dedup_key()];
        if let Some(tf) = self.title_fingerprint() {
            fps.push(tf);
        }
        fps
    }
}

/// Sorted set of lowercased title words longer than 3 characters.
pub fn significant_words(title: &str) -> BTreeSet<String> {
    title
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() > 3)
        .collect()
}

/// Canonicalize a URL for identity comparison.
///
/// Lowercases the host, strips a leading `www.`, strips the trailing `/` from
/// the path, drops the fragment, and removes tracking query parameters
/// (`utm_*` and the [`TRACKING_PARAMS`] list) while keeping the remaining
/// parameters in their original order. Idempotent. Unparseable input falls
/// back to the trimmed, lowercased raw string.
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw.trim()) else {
        return raw.trim().to_lowercase();
    };

    if let Some(host) = url.host_str() {
        let host = host.strip_prefix("www.").unwrap_or(host).to_string();
        if url.set_host(Some(&host)).is_err() {
            return raw.trim().to_lowercase();
        }
    }

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        drop(pairs);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_stable_under_case_and_whitespace() {
        let a = Article::new("Hello World", "https://a.com/1", "A");
        let b = Article::new("  hello WORLD ", "https://a.com/1", "B");
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_dedup_key_ignores_tracking_params() {
        let a = Article::new("Hello", "https://www.example.com/news?utm_source=twitter", "A");
        let b = Article::new("Hello", "https://example.com/news?utm_source=facebook", "B");
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_dedup_key_differs_for_distinct_urls() {
        let a = Article::new("Hello", "https://a.com/1", "A");
        let b = Article::new("Hello", "https://a.com/2", "A");
        assert_ne!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_title_fingerprint_word_order_invariant() {
        let a = Article::new("Rust compiler gains incremental builds", "https://a.com/1", "A");
        let b = Article::new("Incremental builds gains Rust compiler", "https://b.com/2", "B");
        assert_eq!(a.title_fingerprint(), b.title_fingerprint());
    }

    #[test]
    fn test_title_fingerprint_requires_two_significant_words() {
        let a = Article::new("Hi ok", "https://a.com/1", "A");
        assert_eq!(a.title_fingerprint(), None);
        let b = Article::new("Big up now", "https://a.com/2", "A");
        assert_eq!(b.title_fingerprint(), None);
        let c = Article::new("Quantum breakthrough", "https://a.com/3", "A");
        assert!(c.title_fingerprint().is_some());
    }

    #[test]
    fn test_normalize_url_strips_www_fragment_and_trailing_slash() {
        assert_eq!(
            normalize_url("https://www.Example.com/path/?x=1#section"),
            "https://example.com/path?x=1"
        );
    }

    #[test]
    fn test_normalize_url_keeps_param_order() {
        assert_eq!(
            normalize_url("https://a.com/p?b=2&utm_medium=email&a=1"),
            "https://a.com/p?b=2&a=1"
        );
    }

    #[test]
    fn test_normalize_url_idempotent() {
        let cases = [
            "https://www.example.com/news?utm_source=twitter",
            "https://a.com/p?b=2&a=1",
            "https://a.com/",
            "not a url at all",
        ];
        for raw in cases {
            let once = normalize_url(raw);
            assert_eq!(normalize_url(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let json = r#"{
            "title": "Old schema entry",
            "url": "https://a.com/1",
            "source": "A"
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.summary, "");
        assert_eq!(article.category, "general");
        assert_eq!(article.quality_score, 0.5);
        assert_eq!(article.source_count, 1);
        assert!(article.tags.is_empty());
        assert_eq!(article.author, "");
        assert_eq!(article.discussion_url, None);
        assert_eq!(article.relevance, None);
    }

    #[test]
    fn test_article_roundtrip() {
        let mut a = Article::new("Title", "https://a.com/x", "Src");
        a.tags = vec!["lobsters:rust".to_string()];
        a.quality_score = 0.8;
        let json = serde_json::to_string(&a).unwrap();
        let back: Article = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, "Title");
        assert_eq!(back.tags, vec!["lobsters:rust"]);
        assert_eq!(back.quality_score, 0.8);
    }
}
