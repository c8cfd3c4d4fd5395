//! Plain-text console digest.

use crate::models::Article;
use crate::readtime::{estimate_read_minutes, format_read_time};
use crate::utils::truncate_chars;

/// Render a numbered digest for terminal reading.
pub fn format(articles: &[Article]) -> String {
    let mut lines = vec![format!("🗞️  Newswire Digest — {} stories", articles.len())];

    for (i, a) in articles.iter().enumerate() {
        let ts = a
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "—".to_string());
        lines.push(String::new());
        lines.push(format!("{}. {}", i + 1, a.title));
        lines.push(format!(
            "   📰 {} | 🕐 {} | 🏷️  {} | ⏱  {}",
            a.source,
            ts,
            a.category,
            format_read_time(estimate_read_minutes(a))
        ));
        lines.push(format!("   {}", a.url));
        if !a.summary.is_empty() {
            lines.push(format!("   {}", truncate_chars(&a.summary, 150)));
        }
        if let Some(relevance) = a.relevance {
            lines.push(format!("   ⭐ relevance {:.0}%", relevance * 100.0));
        }
    }

    lines.join("\n")
}
