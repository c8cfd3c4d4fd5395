//! Output formatters for the final article list.
//!
//! Thin, stateless renderers: a plain-text console digest, a pretty JSON
//! array of the full article schema, and a Markdown report. Selected by the
//! `--format` flag.

pub mod console;
pub mod json;
pub mod markdown;

use crate::models::Article;

/// Render articles in the named format; unknown names fall back to console.
pub fn render(articles: &[Article], format: &str) -> String {
    match format {
        "json" => json::format(articles),
        "markdown" => markdown::format(articles),
        _ => console::format(articles),
    }
}
