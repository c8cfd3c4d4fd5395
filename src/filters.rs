//! Post-crawl filter chain.
//!
//! A pipeline of pure functions over the article list, applied in a fixed,
//! documented order: category → source → keyword → time window → quality →
//! language → read time → tone → tags → author → profile relevance → limit →
//! sample. Filters whose argument is unset are no-ops.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;

use crate::health::HealthTracker;
use crate::language::filter_by_language;
use crate::models::Article;
use crate::profile::{score_articles, Profile};
use crate::readtime::filter_by_read_time;
use crate::sentiment::filter_by_tone;

/// All post-crawl filter knobs. `Default` disables everything except the
/// output limit.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Comma-separated categories to keep.
    pub category: Option<String>,
    /// Comma-separated categories to drop.
    pub exclude_category: Option<String>,
    /// Case-insensitive substring the source label must contain.
    pub source: Option<String>,
    /// Case-insensitive substring that excludes a source label.
    pub exclude_source: Option<String>,
    /// Keyword that must appear in title or summary.
    pub search: Option<String>,
    /// Keyword that must not appear in title or summary.
    pub exclude: Option<String>,
    /// Keep only articles at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Quality floor in `[0, 1]`; 0 disables.
    pub min_quality: f64,
    /// Weight the quality floor by each source's health modifier.
    pub health_weighted: bool,
    /// Comma-separated language codes to keep.
    pub lang: Option<String>,
    /// Comma-separated language codes to drop.
    pub exclude_lang: Option<String>,
    /// Minimum estimated reading time, minutes.
    pub min_read: Option<usize>,
    /// Maximum estimated reading time, minutes.
    pub max_read: Option<usize>,
    /// Keep only this tone: `positive`, `negative`, or `neutral`.
    pub tone: Option<String>,
    /// Drop articles classified negative.
    pub no_doom: bool,
    /// Comma-separated tag substrings to keep.
    pub tag: Option<String>,
    /// Comma-separated tag substrings to drop.
    pub exclude_tag: Option<String>,
    /// Case-insensitive substring the author must contain.
    pub author: Option<String>,
    /// Case-insensitive substring that excludes an author.
    pub exclude_author: Option<String>,
    /// Interest profile for relevance scoring and re-sort.
    pub profile: Option<Profile>,
    /// Relevance floor applied during profile scoring.
    pub min_relevance: f64,
    /// Final truncation.
    pub limit: usize,
    /// Uniform random sample size; 0 disables.
    pub sample: usize,
}

fn csv_tokens(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Run the full filter chain over a batch.
///
/// `health` supplies the per-source quality modifier when
/// `health_weighted` is set; pass `None` to use raw quality scores.
pub fn apply(mut articles: Vec<Article>, opts: &FilterOptions, health: Option<&HealthTracker>) -> Vec<Article> {
    if let Some(csv) = &opts.category {
        let cats = csv_tokens(csv);
        articles.retain(|a| cats.contains(&a.category.to_lowercase()));
    }
    if let Some(csv) = &opts.exclude_category {
        let cats = csv_tokens(csv);
        articles.retain(|a| !cats.contains(&a.category.to_lowercase()));
    }

    if let Some(q) = &opts.source {
        let q = q.to_lowercase();
        articles.retain(|a| a.source.to_lowercase().contains(&q));
    }
    if let Some(q) = &opts.exclude_source {
        let q = q.to_lowercase();
        articles.retain(|a| !a.source.to_lowercase().contains(&q));
    }

    if let Some(kw) = &opts.search {
        let kw = kw.to_lowercase();
        articles.retain(|a| {
            a.title.to_lowercase().contains(&kw) || a.summary.to_lowercase().contains(&kw)
        });
    }
    if let Some(kw) = &opts.exclude {
        let kw = kw.to_lowercase();
        articles.retain(|a| {
            !a.title.to_lowercase().contains(&kw) && !a.summary.to_lowercase().contains(&kw)
        });
    }

    if let Some(cutoff) = opts.since {
        articles.retain(|a| a.timestamp.is_some_and(|ts| ts >= cutoff));
    }

    if opts.min_quality > 0.0 {
        articles.retain(|a| {
            let modifier = match (opts.health_weighted, health) {
                (true, Some(tracker)) => tracker.health_modifier(&a.source),
                _ => 1.0,
            };
            a.quality_score * modifier >= opts.min_quality
        });
    }

    articles = filter_by_language(articles, opts.lang.as_deref(), opts.exclude_lang.as_deref());
    articles = filter_by_read_time(articles, opts.min_read, opts.max_read);
    articles = filter_by_tone(articles, opts.tone.as_deref(), opts.no_doom);

    if let Some(csv) = &opts.tag {
        let wanted = csv_tokens(csv);
        articles.retain(|a| {
            a.tags.iter().any(|t| {
                let t = t.to_lowercase();
                wanted.iter().any(|w| t.contains(w))
            })
        });
    }
    if let Some(csv) = &opts.exclude_tag {
        let unwanted = csv_tokens(csv);
        articles.retain(|a| {
            !a.tags.iter().any(|t| {
                let t = t.to_lowercase();
                unwanted.iter().any(|w| t.contains(w))
            })
        });
    }

    if let Some(q) = &opts.author {
        let q = q.to_lowercase();
        articles.retain(|a| a.author.to_lowercase().contains(&q));
    }
    if let Some(q) = &opts.exclude_author {
        let q = q.to_lowercase();
        articles.retain(|a| a.author.is_empty() || !a.author.to_lowercase().contains(&q));
    }

    if let Some(profile) = &opts.profile {
        articles = score_articles(articles, profile, opts.min_relevance);
    }

    if opts.limit > 0 {
        articles.truncate(opts.limit);
    }

    if opts.sample > 0 && articles.len() > opts.sample {
        let mut rng = rand::rng();
        articles.shuffle(&mut rng);
        articles.truncate(opts.sample);
    }

    articles
}
