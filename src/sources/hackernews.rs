//! Hacker News source: the free Firebase API, no key needed.
//!
//! Fetches the top-story ID list, then fans out item lookups concurrently
//! while preserving the upstream ranking order. Items that are not stories
//! (or fail to decode) are skipped individually.

use async_trait::async_trait;
use chrono::DateTime;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use serde::Deserialize;
use tracing::{debug, info};

use crate::fetcher::Fetcher;
use crate::models::Article;
use crate::sources::{categorize_keywords, quality_for, Source, SourceError};

const HN_TOP: &str = "https://hacker-news.firebaseio.com/v0/topstories.json";
const HN_ITEM: &str = "https://hacker-news.firebaseio.com/v0/item";

/// Item lookups in flight at once.
const ITEM_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct HnItem {
    pub id: u64,
    #[serde(rename = "type")]
    #[serde(default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub descendants: Option<i64>,
    #[serde(default)]
    pub dead: Option<bool>,
    #[serde(default)]
    pub deleted: Option<bool>,
}

/// Crawl the Hacker News front page.
pub struct HackerNewsSource {
    fetcher: Fetcher,
    limit: usize,
}

impl HackerNewsSource {
    pub fn new(fetcher: Fetcher, limit: usize) -> Self {
        Self { fetcher, limit }
    }
}

#[async_trait]
impl Source for HackerNewsSource {
    fn name(&self) -> &'static str {
        "hackernews"
    }

    async fn crawl(&self) -> Result<Vec<Article>, SourceError> {
        let ids = self.fetcher.fetch_json(HN_TOP).await;
        let ids: Vec<u64> = serde_json::from_value(ids)
            .map_err(|e| format!("top stories list was not an id array: {e}"))?;

        let articles: Vec<Article> = stream::iter(ids.into_iter().take(self.limit))
            .map(|id| {
                let fetcher = self.fetcher.clone();
                async move {
                    let value = fetcher.fetch_json(&format!("{HN_ITEM}/{id}.json")).await;
                    match serde_json::from_value::<HnItem>(value) {
                        Ok(item) => article_from_item(&item),
                        Err(e) => {
                            debug!(id, error = %e, "skipping undecodable item");
                            None
                        }
                    }
                }
            })
            .buffered(ITEM_CONCURRENCY)
            .filter_map(std::future::ready)
            .collect::<Vec<Article>>()
            .await
            .into_iter()
            .unique_by(|a| a.url.clone())
            .collect();

        info!(count = articles.len(), "fetched hacker news stories");
        Ok(articles)
    }
}

/// Map one API item to an article; `None` for non-stories, dead/deleted
/// items, and items without a title.
pub fn article_from_item(item: &HnItem) -> Option<Article> {
    if item.item_type.as_deref() != Some("story") {
        return None;
    }
    if item.dead.unwrap_or(false) || item.deleted.unwrap_or(false) {
        return None;
    }
    let title = item.title.as_deref()?.trim().to_string();
    if title.is_empty() {
        return None;
    }

    let discussion = format!("https://news.ycombinator.com/item?id={}", item.id);
    let url = item.url.clone().unwrap_or_else(|| discussion.clone());
    let score = item.score.unwrap_or(0);
    let comments = item.descendants.unwrap_or(0);

    let mut article = Article::new(title.clone(), url, format!("Hacker News (↑{score})"));
    article.summary = format!("Score: {score} | Comments: {comments} | HN discussion: {discussion}");
    article.timestamp = item
        .time
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    article.category = categorize_keywords(&title, "tech").to_string();
    article.author = item.by.clone().unwrap_or_default();
    article.discussion_url = Some(discussion);
    // Upvotes are the prominence signal; capped well below a perfect score.
    article.quality_score = (quality_for("Hacker News") + score as f64 / 1000.0).min(0.95);
    Some(article)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story() -> HnItem {
        HnItem {
            id: 42,
            item_type: Some("story".to_string()),
            by: Some("pg".to_string()),
            time: Some(1_736_850_600),
            url: Some("https://example.com/post".to_string()),
            score: Some(231),
            title: Some("Show HN: A tiny database".to_string()),
            descendants: Some(57),
            dead: None,
            deleted: None,
        }
    }

    #[test]
    fn test_article_from_story() {
        let article = article_from_item(&story()).unwrap();
        assert_eq!(article.source, "Hacker News (↑231)");
        assert_eq!(article.url, "https://example.com/post");
        assert_eq!(
            article.discussion_url.as_deref(),
            Some("https://news.ycombinator.com/item?id=42")
        );
        assert!(article.summary.contains("Comments: 57"));
        assert_eq!(article.author, "pg");
        assert!(article.timestamp.is_some());
        assert!(article.quality_score > quality_for("Hacker News"));
    }

    #[test]
    fn test_self_posts_link_to_discussion() {
        let mut item = story();
        item.url = None;
        let article = article_from_item(&item).unwrap();
        assert_eq!(article.url, "https://news.ycombinator.com/item?id=42");
    }

    #[test]
    fn test_non_stories_are_skipped() {
        let mut job = story();
        job.item_type = Some("job".to_string());
        assert!(article_from_item(&job).is_none());

        let mut dead = story();
        dead.dead = Some(true);
        assert!(article_from_item(&dead).is_none());

        let mut untitled = story();
        untitled.title = None;
        assert!(article_from_item(&untitled).is_none());
    }

    #[test]
    fn test_keyword_category() {
        let mut item = story();
        item.title = Some("New LLM beats benchmarks".to_string());
        assert_eq!(article_from_item(&item).unwrap().category, "ai");

        let mut item = story();
        item.title = Some("Critical vulnerability in popular router".to_string());
        assert_eq!(article_from_item(&item).unwrap().category, "security");
    }

    #[test]
    fn test_quality_capped() {
        let mut item = story();
        item.score = Some(100_000);
        assert_eq!(article_from_item(&item).unwrap().quality_score, 0.95);
    }
}
