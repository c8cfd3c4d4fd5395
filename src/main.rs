//! # Newswire
//!
//! A parallel news aggregation engine: crawls ~40 independent headline
//! sources concurrently, normalizes them into a common article schema,
//! removes duplicates within and across sources, and emits the merged
//! stream.
//!
//! ## Pipeline
//!
//! 1. **Crawl**: every enabled source runs in a bounded worker pool under a
//!    per-source timeout; failures are isolated and recorded in the health
//!    tracker
//! 2. **Dedup**: a three-stage engine (exact / fingerprint / fuzzy) collapses
//!    the aggregate, keeping the highest-quality representative
//! 3. **History** (optional): articles seen in previous runs are suppressed
//! 4. **Filter**: category, keyword, time, quality, language, read-time,
//!    tone, tag, author, and profile-relevance filters in a fixed order
//! 5. **Output**: console, JSON, Markdown, or ranked story clusters
//!
//! ## Usage
//!
//! ```sh
//! newswire --category tech --since 6h --limit 25
//! newswire --only rss,hackernews --stories
//! newswire --interests "AI, rust" --min-relevance 0.3
//! ```

use std::collections::HashSet;
use std::error::Error;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cache;
mod cli;
mod config;
mod dedup;
mod engine;
mod fetcher;
mod filters;
mod health;
mod history;
mod language;
mod models;
mod outputs;
mod profile;
mod readtime;
mod sentiment;
mod sources;
mod stories;
mod utils;

use cli::Cli;
use dedup::DedupConfig;
use engine::{CrawlEngine, EngineConfig};
use filters::FilterOptions;
use history::HistoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let args = Cli::parse();

    // --- Tracing init ---
    let default_level = if args.verbose { "newswire=debug,info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    debug!(?args, "parsed CLI arguments");

    // Config-file defaults sit under the CLI flags.
    let file = config::load_config();

    let format = args.format.or(file.format).unwrap_or_else(|| "console".to_string());
    let limit = args.limit.or(file.limit).unwrap_or(50);
    let timeout = args.timeout.or(file.timeout).unwrap_or(15);
    let max_workers = args.max_workers.or(file.max_workers).unwrap_or(6);
    let source_timeout = args.source_timeout.or(file.source_timeout).unwrap_or(60);
    let retries = args.retries.or(file.retries).unwrap_or(0);
    let dedupe_threshold = args.dedupe_threshold.or(file.dedupe_threshold).unwrap_or(0.75);
    let dedupe_enabled = !(args.no_dedupe || file.no_dedupe.unwrap_or(false));
    let stories_mode = args.stories || file.stories.unwrap_or(false);

    let cache_dir = cache::default_cache_dir();
    let history_store = HistoryStore::new(cache_dir.clone());

    // --- Maintenance commands that skip the crawl entirely ---
    if args.clear_cache {
        let removed = cache::clear(&cache_dir);
        println!("Removed {removed} cache entries");
        return Ok(());
    }
    if args.clear_history {
        let removed = history_store.clear();
        println!("{}", if removed { "History cleared" } else { "No history to clear" });
        return Ok(());
    }
    if args.history_stats {
        let ttl = match &args.history_ttl {
            Some(raw) => utils::parse_window_secs(raw)?,
            None => history::DEFAULT_HISTORY_TTL,
        };
        let stats = history_store.stats(ttl);
        println!("History: {} total, {} active, {} expired", stats.total_entries, stats.active_entries, stats.expired_entries);
        if let Some(age) = stats.oldest_age_hours {
            println!("Oldest active entry: {age:.1}h");
        }
        return Ok(());
    }
    if args.health {
        print_health_report();
        return Ok(());
    }
    if args.timing {
        print_timing_report();
        return Ok(());
    }
    if args.list_sources {
        println!("Available sources:");
        for key in sources::all_keys() {
            println!("  {key}");
        }
        return Ok(());
    }

    // --- Pre-crawl configuration; errors here surface to the caller ---
    let since = match args.since.as_deref().or(file.since.as_deref()) {
        Some(raw) => Some(utils::parse_since(raw)?),
        None => None,
    };
    let profile_path = args.profile.or(file.profile);
    let interests = args.interests.or(file.interests);
    let profile = match (&profile_path, &interests) {
        (Some(path), _) => Some(profile::load_profile(path)?),
        (None, Some(interests)) => Some(profile::interests_to_profile(interests)),
        (None, None) => None,
    };
    let cache_ttl = if args.cache {
        Some(match &args.cache_ttl {
            Some(raw) => utils::parse_window_secs(raw)?,
            None => cache::DEFAULT_CACHE_TTL,
        })
    } else {
        None
    };
    let history_ttl = match &args.history_ttl {
        Some(raw) => utils::parse_window_secs(raw)?,
        None => history::DEFAULT_HISTORY_TTL,
    };

    // --- Build the enabled source set ---
    let disabled: HashSet<String> = csv_set(args.disable.as_deref().or(file.disable.as_deref()));
    let only_set: HashSet<String> = csv_set(args.only.as_deref().or(file.only.as_deref()));
    let only = (!only_set.is_empty()).then_some(&only_set);
    let enabled = sources::build_sources(&disabled, only, Duration::from_secs(timeout));
    if enabled.is_empty() {
        return Err("all sources are disabled".into());
    }
    info!(sources = enabled.len(), "enabled sources");

    // --- Crawl ---
    let engine_config = EngineConfig {
        max_workers,
        source_timeout: Duration::from_secs(source_timeout),
        retries,
        dedup: DedupConfig { threshold: dedupe_threshold, enabled: dedupe_enabled },
        cache_ttl,
        cache_dir,
    };
    let mut engine = CrawlEngine::new(enabled, engine_config);

    let cancel = engine.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling crawl");
            cancel.cancel();
        }
    });

    eprintln!("🕷️  Crawling news sources...");
    let outcome = engine.crawl().await;
    info!(
        articles = outcome.articles.len(),
        dedup = %outcome.dedup_stats.summary(),
        failed_sources = outcome.stats.values().filter(|&&v| v == -1).count(),
        "crawl finished"
    );

    // --- Post-crawl pipeline ---
    let mut articles = outcome.articles;
    if args.history {
        articles = history_store.filter_seen(articles, history_ttl);
    }

    let opts = FilterOptions {
        category: args.category.or(file.category),
        exclude_category: args.exclude_category.or(file.exclude_category),
        source: args.source.or(file.source),
        exclude_source: args.exclude_source.or(file.exclude_source),
        search: args.search.or(file.search),
        exclude: args.exclude.or(file.exclude),
        since,
        min_quality: args.min_quality.or(file.min_quality).unwrap_or(0.0),
        health_weighted: args.health_weighted,
        lang: args.lang.or(file.lang),
        exclude_lang: args.exclude_lang.or(file.exclude_lang),
        min_read: args.min_read,
        max_read: args.max_read,
        tone: args.tone.or(file.tone),
        no_doom: args.no_doom || file.no_doom.unwrap_or(false),
        tag: args.tag,
        exclude_tag: args.exclude_tag,
        author: args.author,
        exclude_author: args.exclude_author,
        profile,
        min_relevance: args.min_relevance.or(file.min_relevance).unwrap_or(0.0),
        limit,
        sample: args.sample.unwrap_or(0),
    };
    let articles = filters::apply(articles, &opts, Some(engine.health()));

    // --- Output ---
    if stories_mode {
        let clusters = stories::cluster_stories(articles, stories::DEFAULT_STORY_THRESHOLD);
        println!("{}", stories::format_stories(&clusters, limit, true));
    } else {
        println!("{}", outputs::render(&articles, &format));
    }

    let elapsed = start_time.elapsed();
    info!(secs = elapsed.as_secs(), millis = elapsed.subsec_millis(), "execution complete");
    Ok(())
}

fn csv_set(raw: Option<&str>) -> HashSet<String> {
    raw.map(|csv| {
        csv.split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

fn print_health_report() {
    let tracker = health::HealthTracker::load();
    let report = tracker.report();
    if report.is_empty() {
        println!("No health data recorded yet");
        return;
    }
    println!("Source health (worst first):");
    println!(
        "{:<28} {:>8} {:>8} {:>9} {:>14} last success",
        "source", "rate", "crawls", "failures", "avg articles"
    );
    for entry in report {
        println!(
            "{:<28} {:>7.0}% {:>8} {:>9} {:>14.1} {}",
            entry.source,
            entry.success_rate * 100.0,
            entry.total_crawls,
            entry.failures,
            entry.avg_articles,
            entry.last_success.as_deref().unwrap_or("never"),
        );
    }
}

fn print_timing_report() {
    let tracker = health::HealthTracker::load();
    let report = tracker.timing_report();
    if report.is_empty() {
        println!("No timing data recorded yet");
        return;
    }
    println!("Source timings (slowest first):");
    println!(
        "{:<28} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>8}",
        "source", "avg ms", "min", "p50", "p95", "p99", "max", "samples"
    );
    for entry in report {
        println!(
            "{:<28} {:>9.1} {:>9.1} {:>9.1} {:>9.1} {:>9.1} {:>9.1} {:>8}",
            entry.source,
            entry.avg_ms,
            entry.min_ms,
            entry.p50_ms,
            entry.p95_ms,
            entry.p99_ms,
            entry.max_ms,
            entry.samples
        );
    }
}
