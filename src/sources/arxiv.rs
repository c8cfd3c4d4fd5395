//! ArXiv source: recent papers from the public Atom API, no key needed.
//!
//! Queries a set of CS categories OR-ed together, sorted by submission date.
//! The abstract page is the article URL; the PDF rendition is exposed as the
//! discussion link.

use async_trait::async_trait;
use itertools::Itertools;
use tracing::info;

use crate::fetcher::Fetcher;
use crate::models::Article;
use crate::sources::rss::{parse_feed, parse_feed_date};
use crate::sources::{quality_for, Source, SourceError};
use crate::utils::truncate_chars;

const ARXIV_API: &str = "http://export.arxiv.org/api/query";

/// Broad CS coverage by default.
const DEFAULT_CATEGORIES: &[&str] = &["cs.AI", "cs.LG", "cs.CL", "cs.CV", "cs.SE"];

/// Crawl recent ArXiv submissions.
pub struct ArxivSource {
    fetcher: Fetcher,
    categories: Vec<&'static str>,
    limit: usize,
}

impl ArxivSource {
    pub fn new(fetcher: Fetcher, limit: usize) -> Self {
        Self { fetcher, categories: DEFAULT_CATEGORIES.to_vec(), limit }
    }

    fn query_url(&self) -> String {
        let cat_query = self.categories.iter().map(|c| format!("cat:{c}")).join(" OR ");
        format!(
            "{ARXIV_API}?search_query={}&sortBy=submittedDate&sortOrder=descending&start=0&max_results={}",
            urlencoding::encode(&cat_query),
            self.limit
        )
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn name(&self) -> &'static str {
        "arxiv"
    }

    async fn crawl(&self) -> Result<Vec<Article>, SourceError> {
        let xml = self.fetcher.fetch_text(&self.query_url()).await;
        if xml.is_empty() {
            return Err("arxiv query returned no body".into());
        }
        let articles = articles_from_feed(&xml);
        info!(count = articles.len(), "fetched arxiv papers");
        Ok(articles)
    }
}

/// Parse the Atom response into articles.
pub fn articles_from_feed(xml: &str) -> Vec<Article> {
    parse_feed(xml)
        .into_iter()
        .filter_map(|entry| {
            let title = collapse_whitespace(&entry.title);
            let link = entry.link.trim().to_string();
            if title.is_empty() || link.is_empty() {
                return None;
            }

            let mut article = Article::new(title, link.clone(), "ArXiv");
            article.summary = truncate_chars(&collapse_whitespace(&entry.summary), 300);
            article.timestamp = entry.published.as_deref().and_then(parse_feed_date);
            article.category = map_category(&entry.categories).to_string();
            article.tags = entry.categories.clone();
            article.author = format_authors(&entry.authors);
            article.discussion_url = pdf_url(&link);
            article.quality_score = quality_for("ArXiv");
            Some(article)
        })
        .unique_by(|a| a.url.clone())
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Up to three names, then a `+N more` marker.
fn format_authors(authors: &[String]) -> String {
    let mut joined = authors.iter().take(3).join(", ");
    if authors.len() > 3 {
        joined.push_str(&format!(" +{} more", authors.len() - 3));
    }
    joined
}

/// The PDF rendition lives at `/pdf/<id>` next to the `/abs/<id>` page.
fn pdf_url(abs_url: &str) -> Option<String> {
    abs_url
        .contains("/abs/")
        .then(|| abs_url.replacen("/abs/", "/pdf/", 1))
}

/// Map ArXiv category terms onto the closed category set.
fn map_category(terms: &[String]) -> &'static str {
    let joined = terms.join(" ").to_lowercase();
    if ["cs.ai", "cs.lg", "cs.cl", "cs.cv", "cs.ne", "stat.ml"].iter().any(|k| joined.contains(k)) {
        "ai"
    } else if ["cs.cr"].iter().any(|k| joined.contains(k)) {
        "security"
    } else if ["cs."].iter().any(|k| joined.contains(k)) {
        "tech"
    } else {
        "science"
    }
}
