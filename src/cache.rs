//! On-disk result cache for whole crawl results.
//!
//! Caches the (articles, stats) pair of a crawl so repeated runs inside a TTL
//! window skip the network entirely. Entries are compact JSON files in the
//! user cache directory, keyed by a fingerprint of the enabled source set and
//! the dedup threshold, and written atomically. A load failure of any kind is
//! a cache miss, never an error.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::Article;
use crate::utils::write_atomic;

/// Default cache freshness window, seconds.
pub const DEFAULT_CACHE_TTL: u64 = 300;

/// Per-source article counts from a crawl; `-1` marks total source failure.
pub type CrawlStats = BTreeMap<String, i64>;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    cached_at: i64,
    stats: CrawlStats,
    articles: Vec<Article>,
}

/// The user-scoped cache directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("newswire")
}

/// Deterministic cache key for a source configuration: md5 over the sorted
/// source names and the dedup threshold, truncated to 12 hex chars.
pub fn cache_key(source_names: &[&str], dedup_threshold: f64) -> String {
    let mut names: Vec<&str> = source_names.to_vec();
    names.sort_unstable();
    let raw = format!("{}|{}", names.join(","), dedup_threshold);
    format!("{:x}", md5::compute(raw))[..12].to_string()
}

fn entry_path(cache_dir: &PathBuf, key: &str) -> PathBuf {
    cache_dir.join(format!("{key}.json"))
}

/// Load a cached crawl result if fresher than `ttl` seconds.
///
/// Articles decode through the full schema with defaults for fields the
/// cached record predates, so schema additions never invalidate the cache.
pub fn load(key: &str, ttl: u64, cache_dir: &PathBuf) -> Option<(Vec<Article>, CrawlStats)> {
    let path = entry_path(cache_dir, key);
    let raw = std::fs::read_to_string(&path).ok()?;
    let entry: CacheEntry = match serde_json::from_str(&raw) {
        Ok(entry) => entry,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse cache entry");
            return None;
        }
    };
    let age = Utc::now().timestamp() - entry.cached_at;
    if age < 0 || age as u64 > ttl {
        info!(age_secs = age, ttl_secs = ttl, "cache entry stale");
        return None;
    }
    info!(count = entry.articles.len(), age_secs = age, "cache hit");
    Some((entry.articles, entry.stats))
}

/// Save a crawl result under `key`. Failures are logged and swallowed.
pub fn save(key: &str, articles: &[Article], stats: &CrawlStats, cache_dir: &PathBuf) {
    let entry = CacheEntry {
        cached_at: Utc::now().timestamp(),
        stats: stats.clone(),
        articles: articles.to_vec(),
    };
    let json = match serde_json::to_string(&entry) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to serialize cache entry");
            return;
        }
    };
    match write_atomic(&entry_path(cache_dir, key), &json) {
        Ok(()) => info!(count = articles.len(), key, "cache saved"),
        Err(e) => warn!(error = %e, "failed to save cache"),
    }
}

/// Remove every cache entry. Returns the number of files removed.
pub fn clear(cache_dir: &PathBuf) -> usize {
    let Ok(entries) = std::fs::read_dir(cache_dir) else {
        return 0;
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json")
            && std::fs::remove_file(&path).is_ok()
        {
            removed += 1;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_deterministic_and_order_insensitive() {
        let a = cache_key(&["rss", "hackernews", "lobsters"], 0.75);
        let b = cache_key(&["lobsters", "rss", "hackernews"], 0.75);
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert_ne!(a, cache_key(&["rss", "hackernews"], 0.75));
        assert_ne!(a, cache_key(&["rss", "hackernews", "lobsters"], 0.8));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().to_path_buf();
        let articles = vec![Article::new("Hello", "https://a.com/1", "A")];
        let mut stats = CrawlStats::new();
        stats.insert("rss".to_string(), 1);
        stats.insert("hackernews".to_string(), -1);

        save("abc123def456", &articles, &stats, &cache_dir);
        let (loaded, loaded_stats) = load("abc123def456", 300, &cache_dir).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "Hello");
        assert_eq!(loaded_stats.get("hackernews"), Some(&-1));
    }

    #[test]
    fn test_stale_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().to_path_buf();
        let stale = format!(
            r#"{{"cached_at": {}, "stats": {{}}, "articles": []}}"#,
            Utc::now().timestamp() - 1000
        );
        std::fs::write(cache_dir.join("stalekey00000.json"), stale).unwrap();
        assert!(load("stalekey00000", 300, &cache_dir).is_none());
    }

    #[test]
    fn test_missing_and_corrupt_entries_are_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().to_path_buf();
        assert!(load("nosuchkey", 300, &cache_dir).is_none());

        std::fs::write(cache_dir.join("badkey.json"), "{not json").unwrap();
        assert!(load("badkey", 300, &cache_dir).is_none());
    }

    #[test]
    fn test_old_schema_articles_get_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().to_path_buf();
        let entry = format!(
            r#"{{"cached_at": {}, "stats": {{"rss": 1}}, "articles": [
                {{"title": "Old", "url": "https://a.com/1", "source": "A"}}
            ]}}"#,
            Utc::now().timestamp()
        );
        std::fs::write(cache_dir.join("oldschema0000.json"), entry).unwrap();
        let (articles, _) = load("oldschema0000", 300, &cache_dir).unwrap();
        assert_eq!(articles[0].quality_score, 0.5);
        assert_eq!(articles[0].source_count, 1);
    }

    #[test]
    fn test_clear_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().to_path_buf();
        save("key1altech00", &[], &CrawlStats::new(), &cache_dir);
        save("key2altech00", &[], &CrawlStats::new(), &cache_dir);
        assert_eq!(clear(&cache_dir), 2);
        assert_eq!(clear(&cache_dir), 0);
    }
}
