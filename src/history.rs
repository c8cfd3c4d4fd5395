//! Persistent cross-run seen-set.
//!
//! Stores fingerprints of previously seen articles so repeated crawl
//! invocations (for example cron-driven) can suppress already-seen stories.
//! Distinct from the result cache: the cache avoids network work by replaying
//! whole results, history only tracks what has been seen and filters output.
//!
//! Both the exact `dedup_key` and the `title_fingerprint` are recorded per
//! article, so a reworded repeat in a later run is still caught. Expired
//! entries are pruned on every call.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::Article;
use crate::utils::write_atomic;

/// Default seen window, seconds (24 hours).
pub const DEFAULT_HISTORY_TTL: u64 = 86_400;

const HISTORY_FILE: &str = "history.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    seen: BTreeMap<String, i64>,
    #[serde(default)]
    updated_at: i64,
}

/// Stats describing the current history database.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryStats {
    pub total_entries: usize,
    pub active_entries: usize,
    pub expired_entries: usize,
    pub oldest_age_hours: Option<f64>,
}

/// File-backed fingerprint store under a cache directory.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Store rooted in the given cache directory.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { path: cache_dir.join(HISTORY_FILE) }
    }

    fn load_raw(&self) -> BTreeMap<String, i64> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        match serde_json::from_str::<HistoryFile>(&raw) {
            Ok(file) => file.seen,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to load history");
                BTreeMap::new()
            }
        }
    }

    fn save_raw(&self, seen: BTreeMap<String, i64>) {
        let file = HistoryFile { seen, updated_at: Utc::now().timestamp() };
        let json = match serde_json::to_string_pretty(&file) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize history");
                return;
            }
        };
        if let Err(e) = write_atomic(&self.path, &json) {
            warn!(path = %self.path.display(), error = %e, "failed to save history");
        }
    }

    /// Drop articles already seen within the TTL window, then record the
    /// fingerprints of the survivors. Expired entries are pruned first and
    /// the pruned map is persisted even when nothing survives.
    pub fn filter_seen(&self, articles: Vec<Article>, ttl: u64) -> Vec<Article> {
        let now = Utc::now().timestamp();
        let mut seen: BTreeMap<String, i64> = self
            .load_raw()
            .into_iter()
            .filter(|(_, ts)| now - ts < ttl as i64)
            .collect();

        let input_count = articles.len();
        let mut fresh = Vec::new();
        for article in articles {
            let fps = article.fingerprints();
            if fps.iter().any(|fp| seen.contains_key(fp)) {
                continue;
            }
            for fp in fps {
                seen.insert(fp, now);
            }
            fresh.push(article);
        }

        self.save_raw(seen);
        info!(
            input = input_count,
            new = fresh.len(),
            previously_seen = input_count - fresh.len(),
            "history filter applied"
        );
        fresh
    }

    /// Delete the history file. Returns true if a file was removed.
    pub fn clear(&self) -> bool {
        std::fs::remove_file(&self.path).is_ok()
    }

    /// Describe the current database relative to a TTL window.
    pub fn stats(&self, ttl: u64) -> HistoryStats {
        let seen = self.load_raw();
        let now = Utc::now().timestamp();
        let active: Vec<i64> = seen
            .values()
            .copied()
            .filter(|ts| now - ts < ttl as i64)
            .collect();
        let oldest_age_hours = active
            .iter()
            .min()
            .map(|oldest| ((now - oldest) as f64 / 3600.0 * 10.0).round() / 10.0);
        HistoryStats {
            total_entries: seen.len(),
            active_entries: active.len(),
            expired_entries: seen.len() - active.len(),
            oldest_age_hours,
        }
    }
}
