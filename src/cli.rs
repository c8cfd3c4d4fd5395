//! Command-line interface definitions.
//!
//! Filter and crawl knobs are all optional; values left unset fall back to
//! the config file (`~/.newswire.yaml`, `./newswire.yaml`) and then to the
//! built-in defaults, so the CLI always wins over both.

use clap::Parser;

/// Newswire: parallel news aggregation engine.
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_parser = ["console", "json", "markdown"])]
    pub format: Option<String>,

    /// Max articles to display (default: 50)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Comma-separated categories to keep (e.g. "tech,science")
    #[arg(long)]
    pub category: Option<String>,

    /// Comma-separated categories to drop
    #[arg(long)]
    pub exclude_category: Option<String>,

    /// Keep sources whose label contains this substring
    #[arg(long)]
    pub source: Option<String>,

    /// Drop sources whose label contains this substring
    #[arg(long)]
    pub exclude_source: Option<String>,

    /// Keyword that must appear in title or summary
    #[arg(short, long)]
    pub search: Option<String>,

    /// Keyword that must not appear in title or summary
    #[arg(long)]
    pub exclude: Option<String>,

    /// Relative time window (e.g. "30m", "2h", "1d")
    #[arg(long)]
    pub since: Option<String>,

    /// Minimum quality score in [0, 1]
    #[arg(long)]
    pub min_quality: Option<f64>,

    /// Weight the quality floor by each source's crawl health
    #[arg(long)]
    pub health_weighted: bool,

    /// Comma-separated language codes to keep (e.g. "en,es")
    #[arg(long)]
    pub lang: Option<String>,

    /// Comma-separated language codes to drop
    #[arg(long)]
    pub exclude_lang: Option<String>,

    /// Minimum estimated reading time in minutes
    #[arg(long)]
    pub min_read: Option<usize>,

    /// Maximum estimated reading time in minutes
    #[arg(long)]
    pub max_read: Option<usize>,

    /// Keep only articles with this tone
    #[arg(long, value_parser = ["positive", "negative", "neutral"])]
    pub tone: Option<String>,

    /// Drop articles with a negative tone
    #[arg(long)]
    pub no_doom: bool,

    /// Comma-separated tag substrings to keep
    #[arg(long)]
    pub tag: Option<String>,

    /// Comma-separated tag substrings to drop
    #[arg(long)]
    pub exclude_tag: Option<String>,

    /// Keep articles whose author contains this substring
    #[arg(long)]
    pub author: Option<String>,

    /// Drop articles whose author contains this substring
    #[arg(long)]
    pub exclude_author: Option<String>,

    /// Path to a YAML/JSON interest profile for relevance scoring
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Shorthand interests (e.g. "AI, rust, skateboarding")
    #[arg(long)]
    pub interests: Option<String>,

    /// Minimum relevance in [0, 1] when a profile is used
    #[arg(long)]
    pub min_relevance: Option<f64>,

    /// Randomly sample N articles from the results
    #[arg(long)]
    pub sample: Option<usize>,

    /// Comma-separated source keys to enable exclusively
    #[arg(long)]
    pub only: Option<String>,

    /// Comma-separated source keys to skip
    #[arg(long)]
    pub disable: Option<String>,

    /// Per-attempt HTTP timeout in seconds (default: 15)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Parallel crawl workers (default: 6)
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Per-source crawl timeout in seconds (default: 60)
    #[arg(long)]
    pub source_timeout: Option<u64>,

    /// Extra crawl attempts per source after a failure (default: 0)
    #[arg(long)]
    pub retries: Option<u32>,

    /// Fuzzy dedup similarity threshold in [0, 1] (default: 0.75)
    #[arg(long)]
    pub dedupe_threshold: Option<f64>,

    /// Disable deduplication entirely
    #[arg(long)]
    pub no_dedupe: bool,

    /// Serve results from the on-disk cache when fresh
    #[arg(long)]
    pub cache: bool,

    /// Cache freshness window, seconds or suffixed ("10m"; default: 300)
    #[arg(long)]
    pub cache_ttl: Option<String>,

    /// Remove all cache entries and exit
    #[arg(long)]
    pub clear_cache: bool,

    /// Suppress articles seen in previous runs
    #[arg(long)]
    pub history: bool,

    /// Seen window, seconds or suffixed ("48h"; default: 24h)
    #[arg(long)]
    pub history_ttl: Option<String>,

    /// Print history database stats and exit
    #[arg(long)]
    pub history_stats: bool,

    /// Wipe the history database and exit
    #[arg(long)]
    pub clear_history: bool,

    /// Group related articles into ranked stories
    #[arg(long)]
    pub stories: bool,

    /// Print the per-source health report and exit
    #[arg(long)]
    pub health: bool,

    /// Print the per-source timing report and exit
    #[arg(long)]
    pub timing: bool,

    /// List all available sources and exit
    #[arg(long)]
    pub list_sources: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
