//! Per-source crawl health tracking.
//!
//! Records success/failure counts, article volume, and response-time samples
//! for every source across runs, persisted as pretty-printed JSON in the
//! user state directory. The derived success-rate modifier feeds the filter
//! chain as an optional quality weight. The file is rewritten after every
//! run; concurrent crawler processes are not coordinated (last writer wins;
//! the data is diagnostic, not authoritative).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::utils::write_atomic;

/// Response-time samples kept per source.
const RING_SIZE: usize = 50;

/// Raw per-source counters as persisted in `health.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceHealth {
    #[serde(default)]
    pub total_crawls: u64,
    #[serde(default)]
    pub failures: u64,
    #[serde(default)]
    pub total_articles: u64,
    /// ISO-8601 instant of the last successful crawl.
    #[serde(default)]
    pub last_success: Option<String>,
    /// Last [`RING_SIZE`] response times in milliseconds.
    #[serde(default)]
    pub response_times_ms: Vec<f64>,
    #[serde(default, skip_serializing_if = "u64_is_zero")]
    pub retries_used: u64,
}

fn u64_is_zero(v: &u64) -> bool {
    *v == 0
}

/// Computed per-source view for the health report.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSummary {
    pub source: String,
    pub total_crawls: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub avg_articles: f64,
    pub last_success: Option<String>,
}

/// Computed per-source latency view for the timing report.
#[derive(Debug, Clone, Serialize)]
pub struct TimingSummary {
    pub source: String,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub samples: usize,
}

/// Tracks crawl health per source, backed by a JSON file.
#[derive(Debug)]
pub struct HealthTracker {
    data: BTreeMap<String, SourceHealth>,
    path: PathBuf,
}

impl HealthTracker {
    /// Load from the default state location (`~/.newswire/health.json`).
    pub fn load() -> Self {
        Self::load_from(default_health_path())
    }

    /// Load from an explicit path; a missing or corrupt file yields an empty
    /// tracker (the data is diagnostic and rebuilds itself).
    pub fn load_from(path: PathBuf) -> Self {
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(data) => data,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "could not parse health data");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self { data, path }
    }

    /// Persist the current counters. Failures are logged and swallowed.
    pub fn save(&self) {
        let json = match serde_json::to_string_pretty(&self.data) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "could not serialize health data");
                return;
            }
        };
        if let Err(e) = write_atomic(&self.path, &json) {
            warn!(path = %self.path.display(), error = %e, "could not save health data");
        }
    }

    /// Record a successful crawl: article volume, latency sample (ring-
    /// buffered), and retry usage.
    pub fn record_success(&mut self, source: &str, article_count: usize, response_ms: f64, retries_used: u32) {
        let entry = self.data.entry(source.to_string()).or_default();
        entry.total_crawls += 1;
        entry.total_articles += article_count as u64;
        entry.last_success = Some(Utc::now().to_rfc3339());
        entry.retries_used += retries_used as u64;
        if response_ms > 0.0 {
            entry.response_times_ms.push((response_ms * 10.0).round() / 10.0);
            if entry.response_times_ms.len() > RING_SIZE {
                let excess = entry.response_times_ms.len() - RING_SIZE;
                entry.response_times_ms.drain(..excess);
            }
        }
    }

    /// Record a failed crawl (error or timeout).
    pub fn record_failure(&mut self, source: &str) {
        let entry = self.data.entry(source.to_string()).or_default();
        entry.total_crawls += 1;
        entry.failures += 1;
    }

    /// Quality modifier in `{0.5, 0.8, 1.0}` derived from the source's
    /// success rate over its full history. Unknown sources get `1.0`.
    /// Lookup is exact first, then case-insensitive.
    pub fn health_modifier(&self, source: &str) -> f64 {
        let entry = self.data.get(source).or_else(|| {
            let lower = source.to_lowercase();
            self.data.iter().find(|(k, _)| k.to_lowercase() == lower).map(|(_, v)| v)
        });
        let Some(entry) = entry else { return 1.0 };
        if entry.total_crawls == 0 {
            return 1.0;
        }
        let success_rate = 1.0 - entry.failures as f64 / entry.total_crawls as f64;
        if success_rate < 0.5 {
            0.5
        } else if success_rate < 0.8 {
            0.8
        } else {
            1.0
        }
    }

    /// Health entries sorted by success rate, worst first.
    pub fn report(&self) -> Vec<HealthSummary> {
        let mut entries: Vec<HealthSummary> = self
            .data
            .iter()
            .map(|(source, d)| {
                let successes = d.total_crawls - d.failures;
                let success_rate = if d.total_crawls > 0 {
                    1.0 - d.failures as f64 / d.total_crawls as f64
                } else {
                    0.0
                };
                HealthSummary {
                    source: source.clone(),
                    total_crawls: d.total_crawls,
                    failures: d.failures,
                    success_rate: (success_rate * 100.0).round() / 100.0,
                    avg_articles: (d.total_articles as f64 / successes.max(1) as f64 * 10.0).round() / 10.0,
                    last_success: d.last_success.clone(),
                }
            })
            .collect();
        entries.sort_by(|a, b| a.success_rate.total_cmp(&b.success_rate));
        entries
    }

    /// Latency entries with interpolated percentiles, slowest average first.
    pub fn timing_report(&self) -> Vec<TimingSummary> {
        let mut entries: Vec<TimingSummary> = self
            .data
            .iter()
            .filter(|(_, d)| !d.response_times_ms.is_empty())
            .map(|(source, d)| {
                let timings = &d.response_times_ms;
                let mut sorted = timings.clone();
                sorted.sort_by(f64::total_cmp);
                let avg = timings.iter().sum::<f64>() / timings.len() as f64;
                TimingSummary {
                    source: source.clone(),
                    avg_ms: (avg * 10.0).round() / 10.0,
                    min_ms: sorted[0],
                    max_ms: sorted[sorted.len() - 1],
                    p50_ms: (percentile(&sorted, 50.0) * 10.0).round() / 10.0,
                    p95_ms: (percentile(&sorted, 95.0) * 10.0).round() / 10.0,
                    p99_ms: (percentile(&sorted, 99.0) * 10.0).round() / 10.0,
                    samples: timings.len(),
                }
            })
            .collect();
        entries.sort_by(|a, b| b.avg_ms.total_cmp(&a.avg_ms));
        entries
    }
}

/// `p`-th percentile (0–100) of a pre-sorted sample, linear interpolation.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let k = (sorted.len() - 1) as f64 * (p / 100.0);
    let f = k.floor() as usize;
    let c = f + 1;
    if c >= sorted.len() {
        return sorted[sorted.len() - 1];
    }
    let d = k - f as f64;
    sorted[f] + d * (sorted[c] - sorted[f])
}

fn default_health_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| Path::new(".").to_path_buf())
        .join(".newswire")
        .join("health.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> (HealthTracker, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("health.json");
        (HealthTracker::load_from(path), dir)
    }

    #[test]
    fn test_modifier_thresholds() {
        let (mut t, _dir) = tracker();
        // 10 crawls, 1 failure: 90% success.
        for _ in 0..9 {
            t.record_success("solid", 5, 100.0, 0);
        }
        t.record_failure("solid");
        assert_eq!(t.health_modifier("solid"), 1.0);

        // 10 crawls, 3 failures: 70%.
        for _ in 0..7 {
            t.record_success("shaky", 5, 100.0, 0);
        }
        for _ in 0..3 {
            t.record_failure("shaky");
        }
        assert_eq!(t.health_modifier("shaky"), 0.8);

        // Mostly failing: 40%.
        for _ in 0..2 {
            t.record_success("broken", 5, 100.0, 0);
        }
        for _ in 0..3 {
            t.record_failure("broken");
        }
        assert_eq!(t.health_modifier("broken"), 0.5);

        assert_eq!(t.health_modifier("never-seen"), 1.0);
    }

    #[test]
    fn test_modifier_case_insensitive() {
        let (mut t, _dir) = tracker();
        for _ in 0..2 {
            t.record_success("Hacker News", 10, 50.0, 0);
        }
        for _ in 0..8 {
            t.record_failure("Hacker News");
        }
        assert_eq!(t.health_modifier("hacker news"), 0.5);
    }

    #[test]
    fn test_latency_ring_is_bounded() {
        let (mut t, _dir) = tracker();
        for i in 0..80 {
            t.record_success("rss", 1, 100.0 + i as f64, 0);
        }
        let report = t.timing_report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].samples, 50);
        // Oldest samples were dropped.
        assert_eq!(report[0].min_ms, 130.0);
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = vec![10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&sorted, 50.0), 25.0);
        assert_eq!(percentile(&sorted, 0.0), 10.0);
        assert_eq!(percentile(&sorted, 100.0), 40.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_timing_report_sorted_slowest_first() {
        let (mut t, _dir) = tracker();
        t.record_success("fast", 1, 50.0, 0);
        t.record_success("slow", 1, 900.0, 0);
        t.record_success("mid", 1, 300.0, 0);
        let report = t.timing_report();
        let order: Vec<&str> = report.iter().map(|e| e.source.as_str()).collect();
        assert_eq!(order, vec!["slow", "mid", "fast"]);
    }

    #[test]
    fn test_report_sorted_worst_first() {
        let (mut t, _dir) = tracker();
        t.record_success("good", 5, 0.0, 0);
        t.record_failure("bad");
        let report = t.report();
        assert_eq!(report[0].source, "bad");
        assert_eq!(report[0].success_rate, 0.0);
        assert_eq!(report[1].success_rate, 1.0);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("health.json");
        let mut t = HealthTracker::load_from(path.clone());
        t.record_success("rss", 42, 120.5, 1);
        t.record_failure("rss");
        t.save();

        let reloaded = HealthTracker::load_from(path);
        let report = reloaded.report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].total_crawls, 2);
        assert_eq!(report[0].failures, 1);
        assert_eq!(report[0].avg_articles, 42.0);
    }
}
