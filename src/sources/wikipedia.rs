//! Wikipedia Current Events source: curated daily news, no key needed.
//!
//! Scrapes the Current Events portal, a human-curated digest of notable world
//! events. The portal lists events as `<li>` bullets under bold section
//! headings; each bullet links to one or more external news sources plus
//! Wikipedia background articles. External links win as the article URL.

use async_trait::async_trait;
use chrono::Utc;
use scraper::{Html, Selector};
use tracing::info;

use crate::models::Article;
use crate::fetcher::Fetcher;
use crate::sources::{Source, SourceError};
use crate::utils::truncate_chars;

const PORTAL_URL: &str = "https://en.wikipedia.org/wiki/Portal:Current_events";

/// Events curated by Wikipedia editors carry high quality.
const CURATED_QUALITY: f64 = 0.80;

/// Crawl today's curated events.
pub struct WikipediaSource {
    fetcher: Fetcher,
}

impl WikipediaSource {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Source for WikipediaSource {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    async fn crawl(&self) -> Result<Vec<Article>, SourceError> {
        let html = self.fetcher.fetch_text(PORTAL_URL).await;
        if html.is_empty() {
            return Err("current events portal returned no body".into());
        }
        let articles = articles_from_portal(&html);
        info!(count = articles.len(), "collected wikipedia current events");
        Ok(articles)
    }
}

/// Extract events from the portal HTML.
pub fn articles_from_portal(html: &str) -> Vec<Article> {
    let document = Html::parse_document(html);
    let element_selector =
        Selector::parse("b, li, p").expect("static selector");
    let link_selector = Selector::parse("a[href]").expect("static selector");

    let mut articles = Vec::new();
    let mut seen_urls: Vec<String> = Vec::new();
    let mut current_category = "world";

    for element in document.select(&element_selector) {
        let name = element.value().name();
        let text = element.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

        // Bold/paragraph nodes are section labels ("Armed conflicts", ...).
        if name == "b" || name == "p" {
            current_category = map_heading(&text.to_lowercase());
            continue;
        }
        if text.chars().count() < 20 {
            continue;
        }

        let mut ext_url: Option<String> = None;
        let mut wiki_url: Option<String> = None;
        for link in element.select(&link_selector) {
            let Some(raw) = link.value().attr("href") else { continue };
            let href = if let Some(rest) = raw.strip_prefix("//") {
                format!("https://{rest}")
            } else if raw.starts_with("/wiki/") {
                format!("https://en.wikipedia.org{raw}")
            } else {
                raw.to_string()
            };

            if !href.contains("wikipedia.org") && href.starts_with("http") {
                ext_url.get_or_insert(href);
            } else if href.contains("wikipedia.org") && href.contains("/wiki/") {
                wiki_url.get_or_insert(href);
            }
        }

        let Some(url) = ext_url.or(wiki_url) else { continue };
        if seen_urls.contains(&url) {
            continue;
        }
        seen_urls.push(url.clone());

        // First sentence, clipped, as the headline.
        let title = truncate_chars(&text, 150);
        let title = title.split(". ").next().unwrap_or_default().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let mut article = Article::new(title, url, "Wikipedia Current Events");
        if text.chars().count() > 150 {
            article.summary = truncate_chars(&text, 300);
        }
        article.timestamp = Some(Utc::now());
        article.category = current_category.to_string();
        article.quality_score = CURATED_QUALITY;
        article.tags = vec!["wikipedia".to_string(), "curated".to_string()];
        articles.push(article);
    }

    articles
}

/// Map portal section headings onto the closed category set.
fn map_heading(text: &str) -> &'static str {
    let any = |kws: &[&str]| kws.iter().any(|kw| text.contains(kw));
    if any(&["armed", "conflict", "attack", "war", "militar"]) {
        "world"
    } else if any(&["politic", "election", "govern", "law", "legislat", "diplomacy"]) {
        "world"
    } else if any(&["disaster", "environment", "climate", "weather"]) {
        "environment"
    } else if any(&["science", "technology", "space", "health", "medicine"]) {
        "science"
    } else if any(&["business", "econom", "financ", "market", "trade"]) {
        "business"
    } else if any(&["sport"]) {
        "sports"
    } else if any(&["art", "culture", "entertain", "film", "music", "death"]) {
        "culture"
    } else {
        "world"
    }
}
