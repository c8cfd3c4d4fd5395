//! Lobsters source: the free lobste.rs JSON API, no key needed.
//!
//! Fetches the hottest page and maps site tags onto categories. Tags are
//! kept as `lobsters:<tag>` provenance markers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Deserialize;
use tracing::{debug, info};

use crate::fetcher::Fetcher;
use crate::models::Article;
use crate::sources::{quality_for, Source, SourceError};

const LOBSTERS_HOTTEST: &str = "https://lobste.rs/hottest.json";

#[derive(Debug, Clone, Deserialize)]
pub struct LobstersItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub comments_url: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub submitter_user: Option<Submitter>,
}

/// The API has shipped both a bare username string and a user object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Submitter {
    Name(String),
    User { username: String },
}

impl Submitter {
    fn username(&self) -> &str {
        match self {
            Submitter::Name(name) => name,
            Submitter::User { username } => username,
        }
    }
}

/// Crawl the lobste.rs hottest page.
pub struct LobstersSource {
    fetcher: Fetcher,
    limit: usize,
}

impl LobstersSource {
    pub fn new(fetcher: Fetcher, limit: usize) -> Self {
        Self { fetcher, limit }
    }
}

#[async_trait]
impl Source for LobstersSource {
    fn name(&self) -> &'static str {
        "lobsters"
    }

    async fn crawl(&self) -> Result<Vec<Article>, SourceError> {
        let value = self.fetcher.fetch_json(LOBSTERS_HOTTEST).await;
        let items: Vec<LobstersItem> = serde_json::from_value(value)
            .map_err(|e| format!("hottest.json was not a story array: {e}"))?;

        let articles: Vec<Article> = items
            .iter()
            .take(self.limit)
            .filter_map(article_from_item)
            .unique_by(|a| a.url.clone())
            .collect();

        info!(count = articles.len(), "fetched lobsters stories");
        Ok(articles)
    }
}

/// Map one story to an article; `None` for items missing title and URL.
pub fn article_from_item(item: &LobstersItem) -> Option<Article> {
    let title = item.title.trim().to_string();
    let url = if item.url.is_empty() { item.comments_url.clone() } else { item.url.clone() };
    if title.is_empty() || url.is_empty() {
        return None;
    }

    let author = item
        .submitter_user
        .as_ref()
        .map(|s| s.username().to_string())
        .unwrap_or_default();

    let mut summary_parts = vec![format!("Score: {}", item.score)];
    if !author.is_empty() {
        summary_parts.push(format!("By: {author}"));
    }
    summary_parts.push(format!("Comments: {}", item.comment_count));
    if !item.comments_url.is_empty() {
        summary_parts.push(format!("Discussion: {}", item.comments_url));
    }

    let mut article = Article::new(title, url, format!("Lobsters (↑{})", item.score));
    article.summary = summary_parts.join(" | ");
    article.timestamp = item.created_at.as_deref().and_then(parse_created_at);
    article.category = map_category(&item.tags).to_string();
    article.tags = item.tags.iter().map(|t| format!("lobsters:{t}")).collect();
    article.author = author;
    if !item.comments_url.is_empty() {
        article.discussion_url = Some(item.comments_url.clone());
    }
    article.quality_score = (quality_for("Lobsters") + item.score as f64 / 500.0).min(0.95);
    Some(article)
}

fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            debug!(raw, error = %e, "unparseable created_at");
            None
        }
    }
}

/// Map lobste.rs tags onto categories; the site is primarily technical, so
/// the fallback is `tech`.
fn map_category(tags: &[String]) -> &'static str {
    let tag_set: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
    let has = |names: &[&str]| tag_set.iter().any(|t| names.contains(&t.as_str()));
    if has(&["security", "privacy"]) {
        "security"
    } else if has(&["ai", "ml"]) {
        "ai"
    } else if has(&["science", "math"]) {
        "science"
    } else if has(&["culture", "law", "person"]) {
        "culture"
    } else if has(&["practices", "devops", "scaling"]) {
        "business"
    } else {
        "tech"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> LobstersItem {
        LobstersItem {
            title: "A survey of lock-free queues".to_string(),
            url: "https://example.com/queues".to_string(),
            comments_url: "https://lobste.rs/s/abc123".to_string(),
            score: 42,
            comment_count: 17,
            created_at: Some("2025-01-14T10:30:00Z".to_string()),
            tags: vec!["concurrency".to_string(), "rust".to_string()],
            submitter_user: Some(Submitter::Name("alice".to_string())),
        }
    }

    #[test]
    fn test_submitter_object_form_decodes() {
        let json = r#"{
            "title": "Story", "url": "https://e.com/1", "comments_url": "",
            "score": 1, "comment_count": 0,
            "submitter_user": {"username": "bob"}, "tags": []
        }"#;
        let item: LobstersItem = serde_json::from_str(json).unwrap();
        assert_eq!(article_from_item(&item).unwrap().author, "bob");
    }

    #[test]
    fn test_article_from_item() {
        let article = article_from_item(&item()).unwrap();
        assert_eq!(article.source, "Lobsters (↑42)");
        assert_eq!(article.url, "https://example.com/queues");
        assert_eq!(article.tags, vec!["lobsters:concurrency", "lobsters:rust"]);
        assert_eq!(article.author, "alice");
        assert_eq!(article.category, "tech");
        assert_eq!(article.discussion_url.as_deref(), Some("https://lobste.rs/s/abc123"));
        assert!(article.summary.contains("By: alice"));
        assert!(article.timestamp.is_some());
    }

    #[test]
    fn test_text_posts_use_comments_url() {
        let mut it = item();
        it.url = String::new();
        let article = article_from_item(&it).unwrap();
        assert_eq!(article.url, "https://lobste.rs/s/abc123");
    }

    #[test]
    fn test_tag_category_mapping() {
        let mut it = item();
        it.tags = vec!["security".to_string()];
        assert_eq!(article_from_item(&it).unwrap().category, "security");

        it.tags = vec!["math".to_string()];
        assert_eq!(article_from_item(&it).unwrap().category, "science");

        it.tags = vec!["devops".to_string()];
        assert_eq!(article_from_item(&it).unwrap().category, "business");
    }

    #[test]
    fn test_untitled_items_skipped() {
        let mut it = item();
        it.title = String::new();
        assert!(article_from_item(&it).is_none());
    }
}
