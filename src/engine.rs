//! Parallel crawl scheduler.
//!
//! Fans every enabled source out into a bounded worker pool, enforcing a
//! per-source wall-clock timeout per attempt and an optional retry budget.
//! Sources are independent: one failing, hanging, or timing out never affects
//! a peer, and the aggregate keeps declared source order regardless of task
//! completion order. Health recording and aggregation happen on the
//! scheduler side as each task resolves; adapter bodies touch no shared
//! state.
//!
//! Pipeline per run: optional cache consult → pooled crawl → health update →
//! dedup → optional cache save.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use rand::Rng;
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cache::{self, CrawlStats};
use crate::dedup::{deduplicate, DedupConfig, DedupStats};
use crate::health::HealthTracker;
use crate::models::Article;
use crate::sources::Source;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bounded worker-pool width.
    pub max_workers: usize,
    /// Hard wall-clock cap per crawl attempt.
    pub source_timeout: Duration,
    /// Additional attempts after a failed or timed-out crawl.
    pub retries: u32,
    /// Dedup pass settings.
    pub dedup: DedupConfig,
    /// Result-cache TTL in seconds; `None` disables caching.
    pub cache_ttl: Option<u64>,
    /// Directory holding cache entries.
    pub cache_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: 6,
            source_timeout: Duration::from_secs(60),
            retries: 0,
            dedup: DedupConfig::default(),
            cache_ttl: None,
            cache_dir: cache::default_cache_dir(),
        }
    }
}

/// Everything a crawl run produces.
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Deduplicated articles in declared source order.
    pub articles: Vec<Article>,
    /// Per-source article counts; `-1` marks a source that failed entirely.
    pub stats: CrawlStats,
    /// Counters from the dedup pass.
    pub dedup_stats: DedupStats,
}

enum SourceResult {
    Success { articles: Vec<Article>, latency_ms: f64, retries_used: u32 },
    Failure,
}

/// Scheduler over an ordered set of enabled sources.
pub struct CrawlEngine {
    sources: Vec<Arc<dyn Source>>,
    config: EngineConfig,
    health: HealthTracker,
    cancel: CancellationToken,
}

impl CrawlEngine {
    /// Engine with health state loaded from the default location.
    pub fn new(sources: Vec<Arc<dyn Source>>, config: EngineConfig) -> Self {
        Self::with_health(sources, config, HealthTracker::load())
    }

    /// Engine with explicit health state (tests, alternate state dirs).
    pub fn with_health(
        sources: Vec<Arc<dyn Source>>,
        config: EngineConfig,
        health: HealthTracker,
    ) -> Self {
        Self { sources, config, health, cancel: CancellationToken::new() }
    }

    /// Token that cancels the run; in-flight sources observe it at their
    /// next attempt boundary and partial results already aggregated are kept.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Health state accumulated so far.
    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    /// Run the full crawl pipeline.
    ///
    /// Never fails: a run where every source breaks returns an empty list
    /// and an all `-1` stats map.
    pub async fn crawl(&mut self) -> CrawlOutcome {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();

        if let Some(ttl) = self.config.cache_ttl {
            let key = cache::cache_key(&names, self.config.dedup.threshold);
            if let Some((articles, stats)) = cache::load(&key, ttl, &self.config.cache_dir) {
                let dedup_stats = DedupStats {
                    total_input: articles.len(),
                    unique_output: articles.len(),
                    ..Default::default()
                };
                return CrawlOutcome { articles, stats, dedup_stats };
            }
        }

        let run_start = Instant::now();
        info!(
            sources = self.sources.len(),
            max_workers = self.config.max_workers,
            "starting crawl"
        );

        let source_timeout = self.config.source_timeout;
        let retries = self.config.retries;
        let cancel = self.cancel.clone();

        let mut results = stream::iter(self.sources.iter().cloned())
            .map(|source| {
                let cancel = cancel.clone();
                async move {
                    let name = source.name();
                    let result = crawl_source(source, source_timeout, retries, cancel).await;
                    (name, result)
                }
            })
            .buffered(self.config.max_workers.max(1));

        let mut aggregate: Vec<Article> = Vec::new();
        let mut stats = CrawlStats::new();
        while let Some((name, result)) = results.next().await {
            match result {
                SourceResult::Success { articles, latency_ms, retries_used } => {
                    self.health.record_success(name, articles.len(), latency_ms, retries_used);
                    stats.insert(name.to_string(), articles.len() as i64);
                    aggregate.extend(articles);
                }
                SourceResult::Failure => {
                    self.health.record_failure(name);
                    stats.insert(name.to_string(), -1);
                }
            }
        }
        drop(results);

        self.health.save();

        let (articles, dedup_stats) = deduplicate(aggregate, &self.config.dedup);
        info!(
            articles = articles.len(),
            dedup = %dedup_stats.summary(),
            elapsed_ms = run_start.elapsed().as_millis() as u64,
            "crawl complete"
        );

        if self.config.cache_ttl.is_some() {
            let key = cache::cache_key(&names, self.config.dedup.threshold);
            cache::save(&key, &articles, &stats, &self.config.cache_dir);
        }

        CrawlOutcome { articles, stats, dedup_stats }
    }
}

/// Crawl one source under the per-attempt timeout and retry budget.
async fn crawl_source(
    source: Arc<dyn Source>,
    source_timeout: Duration,
    retries: u32,
    cancel: CancellationToken,
) -> SourceResult {
    let name = source.name();
    for attempt in 0..=retries {
        if cancel.is_cancelled() {
            warn!(source = name, "crawl cancelled before attempt");
            return SourceResult::Failure;
        }

        let attempt_start = Instant::now();
        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                warn!(source = name, "crawl cancelled mid-attempt");
                return SourceResult::Failure;
            }
            result = timeout(source_timeout, source.crawl()) => result,
        };

        match outcome {
            Ok(Ok(articles)) => {
                return SourceResult::Success {
                    articles,
                    latency_ms: attempt_start.elapsed().as_secs_f64() * 1000.0,
                    retries_used: attempt,
                };
            }
            Ok(Err(e)) => {
                warn!(source = name, attempt, error = %e, "source crawl failed");
            }
            Err(_) => {
                warn!(
                    source = name,
                    attempt,
                    timeout_secs = source_timeout.as_secs_f64(),
                    "source crawl timed out"
                );
            }
        }

        if attempt < retries {
            let backoff = retry_backoff(attempt);
            sleep(backoff).await;
        }
    }
    SourceResult::Failure
}

/// `500ms · 2^attempt` with ±50% jitter.
fn retry_backoff(attempt: u32) -> Duration {
    let base = 0.5 * 2f64.powi(attempt as i32);
    let jitter: f64 = rand::rng().random_range(-0.5..=0.5);
    Duration::from_secs_f64((base * (1.0 + jitter)).max(0.0))
}
