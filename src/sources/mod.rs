//! Source adapters: one upstream per module, one uniform contract.
//!
//! Every adapter implements [`Source`]: a stable short key plus an async
//! `crawl()` that fetches its upstream, maps fields into [`Article`]s, and
//! self-deduplicates by URL. Adapters never panic out of `crawl()`; upstream
//! trouble surfaces as an `Err` (total failure) or a shorter list (partial
//! parse trouble, logged and skipped item by item).
//!
//! | Key | Upstream | Protocol |
//! |-----|----------|----------|
//! | `rss` | curated feed list | RSS/Atom |
//! | `hackernews` | Firebase API | JSON |
//! | `lobsters` | lobste.rs | JSON |
//! | `devto` | dev.to API | JSON |
//! | `arxiv` | export.arxiv.org | Atom |
//! | `wikipedia` | Current Events portal | HTML |

pub mod arxiv;
pub mod devto;
pub mod hackernews;
pub mod lobsters;
pub mod rss;
pub mod wikipedia;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::warn;

use crate::fetcher::Fetcher;
use crate::models::Article;

/// Error type adapters may return from `crawl()`.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// One external upstream with a stable short name.
///
/// Implementations are stateless between invocations; `crawl()` is idempotent
/// and side-effect-free apart from its network calls.
#[async_trait]
pub trait Source: Send + Sync {
    /// Stable short key, e.g. `"hackernews"`.
    fn name(&self) -> &'static str;

    /// Fetch and map one round of upstream content.
    async fn crawl(&self) -> Result<Vec<Article>, SourceError>;
}

/// Stable declared order of all source keys.
pub fn all_keys() -> Vec<&'static str> {
    vec!["rss", "hackernews", "lobsters", "devto", "arxiv", "wikipedia"]
}

/// Build the enabled source set in declared order.
///
/// `disabled` removes keys; `only`, when set, removes everything else. Each
/// adapter gets a [`Fetcher`] configured with the shared per-attempt timeout.
pub fn build_sources(
    disabled: &HashSet<String>,
    only: Option<&HashSet<String>>,
    timeout: Duration,
) -> Vec<Arc<dyn Source>> {
    let enabled = |key: &str| {
        if disabled.contains(key) {
            return false;
        }
        only.is_none_or(|only| only.contains(key))
    };

    let fetcher = || Fetcher::new(timeout, 2, 0.5);

    let mut sources: Vec<Arc<dyn Source>> = Vec::new();
    if enabled("rss") {
        sources.push(Arc::new(rss::RssSource::new(fetcher())));
    }
    if enabled("hackernews") {
        sources.push(Arc::new(hackernews::HackerNewsSource::new(fetcher(), 30)));
    }
    if enabled("lobsters") {
        sources.push(Arc::new(lobsters::LobstersSource::new(fetcher(), 25)));
    }
    if enabled("devto") {
        sources.push(Arc::new(devto::DevToSource::new(fetcher(), 30)));
    }
    if enabled("arxiv") {
        sources.push(Arc::new(arxiv::ArxivSource::new(fetcher(), 25)));
    }
    if enabled("wikipedia") {
        sources.push(Arc::new(wikipedia::WikipediaSource::new(fetcher())));
    }
    sources
}

/// Specific keyword buckets checked before an adapter's generic fallback.
/// Order matters: the first bucket with a hit wins. Single-word keywords
/// match whole words (a trailing `-` makes them a word prefix); phrases
/// match as substrings.
const KEYWORD_BUCKETS: &[(&str, &[&str])] = &[
    ("ai", &["ai", "llm", "gpt", "machine learning", "neural network", "deep learning", "chatbot"]),
    ("security", &["security", "vulnerability", "breach", "exploit", "malware", "ransomware", "cve-", "zero-day", "phishing"]),
    ("crypto", &["bitcoin", "ethereum", "cryptocurrency", "blockchain", "stablecoin"]),
    ("science", &["quantum", "physics", "biology", "genome", "telescope", "astronomy", "fusion reactor"]),
    ("gaming", &["video game", "playstation", "nintendo", "xbox", "steam deck"]),
];

/// Two-tier category mapping: a specific keyword table evaluated against the
/// text, falling back to the adapter's generic bucket.
pub fn categorize_keywords(text: &str, fallback: &'static str) -> &'static str {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| !w.is_empty())
        .collect();
    for (category, keywords) in KEYWORD_BUCKETS {
        let hit = keywords.iter().any(|kw| {
            if kw.contains(' ') {
                lower.contains(kw)
            } else if let Some(prefix) = kw.strip_suffix('-') {
                words.iter().any(|w| w.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('-')))
            } else {
                words.contains(kw)
            }
        });
        if hit {
            return category;
        }
    }
    fallback
}

#[derive(Debug, Deserialize)]
struct WeightsFile {
    #[serde(default)]
    sources: HashMap<String, f64>,
}

static WEIGHTS: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    match serde_yaml::from_str::<WeightsFile>(include_str!("source_weights.yaml")) {
        Ok(file) => file.sources,
        Err(e) => {
            warn!(error = %e, "failed to parse source_weights.yaml");
            HashMap::new()
        }
    }
});

/// Default quality for sources without a configured weight.
pub const DEFAULT_QUALITY: f64 = 0.5;

/// Quality weight for a source label: exact match first, then
/// case-insensitive substring in either direction.
pub fn quality_for(source_name: &str) -> f64 {
    if let Some(&score) = WEIGHTS.get(source_name) {
        return score;
    }
    let lower = source_name.to_lowercase();
    for (key, &score) in WEIGHTS.iter() {
        let key_lower = key.to_lowercase();
        if key_lower.contains(&lower) || lower.contains(&key_lower) {
            return score;
        }
    }
    DEFAULT_QUALITY
}
