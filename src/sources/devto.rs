//! dev.to source: public articles API, no key needed.
//!
//! Pulls the front-page article list and maps dev.to tags onto categories
//! via a specific tag table with a `tech` fallback.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Deserialize;
use tracing::info;

use crate::fetcher::Fetcher;
use crate::models::Article;
use crate::sources::{quality_for, Source, SourceError};
use crate::utils::truncate_chars;

const DEVTO_API: &str = "https://dev.to/api/articles";

/// dev.to tag → category.
const TAG_CATEGORIES: &[(&str, &str)] = &[
    ("ai", "ai"),
    ("machinelearning", "ai"),
    ("security", "security"),
    ("cybersecurity", "security"),
    ("career", "business"),
    ("productivity", "business"),
    ("discuss", "culture"),
    ("news", "world"),
    ("science", "science"),
    ("gamedev", "gaming"),
    ("design", "design"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct DevToItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tag_list: TagList,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub positive_reactions_count: i64,
    #[serde(default)]
    pub user: Option<DevToUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevToUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
}

/// `tag_list` arrives as an array on the list endpoint and a comma-joined
/// string on the single-article endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagList {
    List(Vec<String>),
    Joined(String),
}

impl Default for TagList {
    fn default() -> Self {
        TagList::List(Vec::new())
    }
}

impl TagList {
    fn tags(&self) -> Vec<String> {
        match self {
            TagList::List(tags) => tags.clone(),
            TagList::Joined(s) => s
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

/// Crawl the dev.to front page.
pub struct DevToSource {
    fetcher: Fetcher,
    per_page: usize,
}

impl DevToSource {
    pub fn new(fetcher: Fetcher, per_page: usize) -> Self {
        Self { fetcher, per_page }
    }
}

#[async_trait]
impl Source for DevToSource {
    fn name(&self) -> &'static str {
        "devto"
    }

    async fn crawl(&self) -> Result<Vec<Article>, SourceError> {
        let url = format!("{DEVTO_API}?per_page={}", self.per_page);
        let value = self.fetcher.fetch_json(&url).await;
        let items: Vec<DevToItem> = serde_json::from_value(value)
            .map_err(|e| format!("articles endpoint was not an array: {e}"))?;

        let articles: Vec<Article> = items
            .iter()
            .filter_map(article_from_item)
            .unique_by(|a| a.url.clone())
            .collect();

        info!(count = articles.len(), "fetched dev.to articles");
        Ok(articles)
    }
}

/// Map one API item to an article; `None` without title and URL.
pub fn article_from_item(item: &DevToItem) -> Option<Article> {
    let title = item.title.trim().to_string();
    if title.is_empty() || item.url.is_empty() {
        return None;
    }

    let tags = item.tag_list.tags();
    let category = tags
        .iter()
        .find_map(|tag| {
            let tag = tag.to_lowercase();
            TAG_CATEGORIES.iter().find(|(t, _)| *t == tag).map(|(_, c)| *c)
        })
        .unwrap_or("tech");

    let author = item
        .user
        .as_ref()
        .map(|u| if u.name.is_empty() { u.username.clone() } else { u.name.clone() })
        .unwrap_or_default();

    let mut summary = truncate_chars(&item.description, 300);
    if !author.is_empty() {
        summary = format!("by {author} — {summary}");
    }
    if item.positive_reactions_count > 0 {
        summary = format!("♥{} | {}", item.positive_reactions_count, summary);
    }

    let mut article = Article::new(title, item.url.clone(), "dev.to");
    article.summary = truncate_chars(&summary, 300);
    article.timestamp = item
        .published_at
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc));
    article.category = category.to_string();
    article.tags = tags.into_iter().take(5).collect();
    article.author = author;
    article.quality_score =
        (quality_for("dev.to") + item.positive_reactions_count as f64 / 1000.0).min(0.9);
    Some(article)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> DevToItem {
        DevToItem {
            title: "Understanding async runtimes".to_string(),
            url: "https://dev.to/alice/async-runtimes".to_string(),
            description: "A walkthrough of executors and wakers".to_string(),
            tag_list: TagList::List(vec!["rust".to_string(), "tutorial".to_string()]),
            published_at: Some("2025-01-14T10:30:00Z".to_string()),
            positive_reactions_count: 12,
            user: Some(DevToUser { name: "Alice".to_string(), username: "alice".to_string() }),
        }
    }

    #[test]
    fn test_article_from_item() {
        let article = article_from_item(&item()).unwrap();
        assert_eq!(article.source, "dev.to");
        assert_eq!(article.category, "tech");
        assert_eq!(article.author, "Alice");
        assert_eq!(article.tags, vec!["rust", "tutorial"]);
        assert!(article.summary.starts_with("♥12 | by Alice"));
        assert!(article.timestamp.is_some());
    }

    #[test]
    fn test_tag_category_table() {
        let mut it = item();
        it.tag_list = TagList::List(vec!["webdev".to_string(), "security".to_string()]);
        assert_eq!(article_from_item(&it).unwrap().category, "security");

        it.tag_list = TagList::Joined("career, productivity".to_string());
        assert_eq!(article_from_item(&it).unwrap().category, "business");
    }

    #[test]
    fn test_joined_tag_list_decodes() {
        let json = r#"{
            "title": "T", "url": "https://dev.to/x", "description": "",
            "tag_list": "rust, go", "positive_reactions_count": 0
        }"#;
        let it: DevToItem = serde_json::from_str(json).unwrap();
        assert_eq!(article_from_item(&it).unwrap().tags, vec!["rust", "go"]);
    }

    #[test]
    fn test_tags_capped_at_five() {
        let mut it = item();
        it.tag_list = TagList::Joined("a, b, c, d, e, f, g".to_string());
        assert_eq!(article_from_item(&it).unwrap().tags.len(), 5);
    }

    #[test]
    fn test_incomplete_items_skipped() {
        let mut it = item();
        it.url = String::new();
        assert!(article_from_item(&it).is_none());
    }
}
