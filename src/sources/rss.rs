//! RSS/Atom feed source: the workhorse of the crawl.
//!
//! Crawls a curated list of feeds, each carrying its own source label and
//! category. Both RSS 2.0 (`<item>`) and Atom (`<entry>`) documents are
//! handled by one streaming parser. Feeds fail independently: a dead feed is
//! logged and skipped, never aborting the adapter.

use itertools::Itertools;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info, warn};

use crate::fetcher::Fetcher;
use crate::models::Article;
use crate::sources::{quality_for, Source, SourceError};
use crate::utils::{strip_html, truncate_chars};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

/// Entries taken per feed.
const PER_FEED_CAP: usize = 20;

/// Feeds fetched concurrently.
const FEED_CONCURRENCY: usize = 4;

/// One feed endpoint with its display label and category.
#[derive(Debug, Clone)]
pub struct FeedSpec {
    pub url: &'static str,
    pub source: &'static str,
    pub category: &'static str,
}

macro_rules! feed {
    ($url:expr, $source:expr, $category:expr) => {
        FeedSpec { url: $url, source: $source, category: $category }
    };
}

/// Curated default feed list.
pub fn default_feeds() -> Vec<FeedSpec> {
    vec![
        // --- Tech ---
        feed!("https://feeds.arstechnica.com/arstechnica/index", "Ars Technica", "tech"),
        feed!("https://www.theverge.com/rss/index.xml", "The Verge", "tech"),
        feed!("https://techcrunch.com/feed/", "TechCrunch", "tech"),
        feed!("https://www.wired.com/feed/rss", "Wired", "tech"),
        feed!("https://feeds.feedburner.com/TheHackersNews", "The Hacker News", "tech"),
        feed!("https://www.technologyreview.com/feed/", "MIT Technology Review", "tech"),
        feed!("https://spectrum.ieee.org/feeds/feed.rss", "IEEE Spectrum", "tech"),
        feed!("https://lwn.net/headlines/rss", "LWN.net", "tech"),
        feed!("https://lobste.rs/rss", "Lobsters", "tech"),
        feed!("https://www.phoronix.com/rss.php", "Phoronix", "tech"),
        feed!("https://www.404media.co/rss/", "404 Media", "tech"),
        feed!("https://www.techdirt.com/feed/", "TechDirt", "tech"),
        feed!("https://thenextweb.com/feed", "The Next Web", "tech"),
        feed!("https://torrentfreak.com/feed/", "TorrentFreak", "tech"),
        feed!("https://restofworld.org/feed/", "Rest of World", "tech"),
        feed!("https://hnrss.org/show", "HN Show", "tech"),
        feed!("https://hnrss.org/ask", "HN Ask", "tech"),
        feed!("https://hnrss.org/best", "HN Best", "tech"),
        feed!("https://spectrum.ieee.org/feeds/topic/artificial-intelligence.rss", "IEEE AI", "ai"),
        // --- Security ---
        feed!("https://www.schneier.com/feed/", "Schneier on Security", "security"),
        feed!("https://krebsonsecurity.com/feed/", "Krebs on Security", "security"),
        feed!("https://www.eff.org/rss/updates.xml", "EFF Updates", "security"),
        // --- World ---
        feed!("https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml", "NY Times", "world"),
        feed!("https://feeds.bbci.co.uk/news/rss.xml", "BBC News", "world"),
        feed!("https://www.theguardian.com/world/rss", "The Guardian", "world"),
        feed!("https://www.aljazeera.com/xml/rss/all.xml", "Al Jazeera", "world"),
        feed!("https://rss.dw.com/rdf/rss-en-all", "DW", "world"),
        feed!("https://feeds.npr.org/1001/rss.xml", "NPR", "world"),
        feed!("https://news.google.com/rss", "Google News", "world"),
        // --- Science ---
        feed!("https://www.sciencedaily.com/rss/all.xml", "ScienceDaily", "science"),
        feed!("https://phys.org/rss-feed/", "Phys.org", "science"),
        feed!("https://www.nature.com/nature.rss", "Nature", "science"),
        feed!("https://theconversation.com/articles.atom", "The Conversation", "science"),
        feed!("https://www.newscientist.com/feed/home", "New Scientist", "science"),
        feed!("https://nautil.us/feed/", "Nautilus", "science"),
        // --- Business ---
        feed!("https://feeds.bloomberg.com/markets/news.rss", "Bloomberg", "business"),
        feed!("https://search.cnbc.com/rs/search/combinedcms/view.xml?partnerId=wrss01&id=100003114", "CNBC", "business"),
        // --- Investigative ---
        feed!("https://www.propublica.org/feeds/propublica/main", "ProPublica", "investigative"),
        feed!("https://theintercept.com/feed/?rss", "The Intercept", "investigative"),
        // --- Culture ---
        feed!("https://www.theatlantic.com/feed/all/", "The Atlantic", "culture"),
    ]
}

/// Crawl a list of RSS/Atom feeds.
pub struct RssSource {
    fetcher: Fetcher,
    feeds: Vec<FeedSpec>,
}

impl RssSource {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher, feeds: default_feeds() }
    }
}

#[async_trait]
impl Source for RssSource {
    fn name(&self) -> &'static str {
        "rss"
    }

    async fn crawl(&self) -> Result<Vec<Article>, SourceError> {
        let articles: Vec<Article> = stream::iter(self.feeds.clone())
            .map(|spec| {
                let fetcher = self.fetcher.clone();
                async move {
                    let xml = fetcher.fetch_text(spec.url).await;
                    if xml.is_empty() {
                        warn!(feed = spec.source, url = spec.url, "feed fetch failed");
                        return Vec::new();
                    }
                    let built = build_articles(&spec, &xml);
                    info!(feed = spec.source, count = built.len(), "parsed feed");
                    built
                }
            })
            .buffered(FEED_CONCURRENCY)
            .collect::<Vec<Vec<Article>>>()
            .await
            .into_iter()
            .flatten()
            .unique_by(|a| a.url.clone())
            .collect();

        Ok(articles)
    }
}

/// Map parsed feed entries to articles under a feed's label and category.
fn build_articles(spec: &FeedSpec, xml: &str) -> Vec<Article> {
    parse_feed(xml)
        .into_iter()
        .take(PER_FEED_CAP)
        .filter_map(|entry| {
            let title = entry.title.trim().to_string();
            let link = entry.link.trim().to_string();
            if title.is_empty() || link.is_empty() {
                return None;
            }
            let mut article = Article::new(title, link, spec.source);
            article.category = spec.category.to_string();
            article.summary = truncate_chars(&strip_html(&entry.summary), 300);
            article.timestamp = entry.published.as_deref().and_then(parse_feed_date);
            article.author = entry.author.trim().to_string();
            article.quality_score = quality_for(spec.source);
            Some(article)
        })
        .collect()
}

/// One `<item>`/`<entry>` worth of extracted fields.
#[derive(Debug, Default, Clone)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: Option<String>,
    /// First author; feeds with several keep the rest in `authors`.
    pub author: String,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Summary,
    Content,
    Published,
    Author,
    Category,
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Streaming parse of an RSS 2.0 or Atom document into entries.
///
/// Tolerant by construction: unknown elements are ignored, a malformed
/// document yields whatever entries were completed before the error.
pub fn parse_feed(xml: &str) -> Vec<FeedEntry> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut field: Option<Field> = None;
    let mut in_author_block = false;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"item" | b"entry" => {
                        current = Some(FeedEntry::default());
                        field = None;
                    }
                    name if current.is_some() => {
                        text.clear();
                        field = match name {
                            b"title" => Some(Field::Title),
                            b"link" => {
                                // Atom carries the target in `href`.
                                if let Some(entry) = current.as_mut() {
                                    if let Some(href) = attr_value(&e, b"href") {
                                        let rel = attr_value(&e, b"rel");
                                        if entry.link.is_empty()
                                            && rel.as_deref().is_none_or(|r| r == "alternate")
                                        {
                                            entry.link = href;
                                        }
                                    }
                                }
                                Some(Field::Link)
                            }
                            b"description" | b"summary" => Some(Field::Summary),
                            b"encoded" => Some(Field::Content),
                            b"pubDate" | b"published" | b"updated" | b"date" => {
                                Some(Field::Published)
                            }
                            b"author" => {
                                in_author_block = true;
                                Some(Field::Author)
                            }
                            b"name" if in_author_block => Some(Field::Author),
                            b"creator" => Some(Field::Author),
                            b"category" => {
                                if let (Some(entry), Some(term)) =
                                    (current.as_mut(), attr_value(&e, b"term"))
                                {
                                    entry.categories.push(term);
                                }
                                Some(Field::Category)
                            }
                            _ => None,
                        };
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(entry) = current.as_mut() {
                    match e.local_name().as_ref() {
                        b"link" => {
                            if let Some(href) = attr_value(&e, b"href") {
                                let rel = attr_value(&e, b"rel");
                                if entry.link.is_empty()
                                    && rel.as_deref().is_none_or(|r| r == "alternate")
                                {
                                    entry.link = href;
                                }
                            }
                        }
                        b"category" => {
                            if let Some(term) = attr_value(&e, b"term") {
                                entry.categories.push(term);
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if current.is_some() && field.is_some() {
                    if let Ok(decoded) = t.decode() {
                        if let Ok(unescaped) = unescape(&decoded) {
                            text.push_str(&unescaped);
                        }
                    }
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if current.is_some() && field.is_some() {
                    if let Ok(decoded) = r.decode() {
                        if let Some(ch) = r.resolve_char_ref().ok().flatten() {
                            text.push(ch);
                        } else if let Some(resolved) = resolve_predefined_entity(&decoded) {
                            text.push_str(resolved);
                        }
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if current.is_some() && field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"item" | b"entry" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                        field = None;
                        in_author_block = false;
                    }
                    b"author" => {
                        // RSS authors are bare text; Atom's nested <name>
                        // has already committed and left `field` empty.
                        if let (Some(entry), Some(f)) = (current.as_mut(), field.take()) {
                            commit_field(entry, f, text.trim());
                        }
                        text.clear();
                        in_author_block = false;
                    }
                    _ => {
                        if let (Some(entry), Some(f)) = (current.as_mut(), field.take()) {
                            commit_field(entry, f, text.trim());
                        }
                        text.clear();
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "feed parse error; keeping completed entries");
                break;
            }
        }
    }
    entries
}

fn commit_field(entry: &mut FeedEntry, field: Field, value: &str) {
    if value.is_empty() {
        return;
    }
    match field {
        Field::Title => {
            if entry.title.is_empty() {
                entry.title = value.to_string();
            }
        }
        Field::Link => {
            if entry.link.is_empty() {
                entry.link = value.to_string();
            }
        }
        Field::Summary => {
            if entry.summary.is_empty() {
                entry.summary = value.to_string();
            }
        }
        Field::Content => {
            if entry.summary.is_empty() {
                entry.summary = value.to_string();
            }
        }
        Field::Published => {
            if entry.published.is_none() {
                entry.published = Some(value.to_string());
            }
        }
        Field::Author => {
            if entry.author.is_empty() {
                entry.author = value.to_string();
            }
            entry.authors.push(value.to_string());
        }
        Field::Category => entry.categories.push(value.to_string()),
    }
}

/// Parse a feed timestamp: RFC 2822 (RSS `pubDate`) or RFC 3339 (Atom).
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
