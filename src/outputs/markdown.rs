//! Markdown report output.

use crate::models::Article;
use crate::utils::truncate_chars;

/// Render articles as a Markdown digest.
pub fn format(articles: &[Article]) -> String {
    let mut lines = vec![format!("# 🗞️ Newswire Digest — {} stories", articles.len()), String::new()];
    for (i, a) in articles.iter().enumerate() {
        let ts = a
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        lines.push(format!("### {}. {}", i + 1, a.title));
        lines.push(format!(
            "**Source:** {} | **Time:** {} | **Category:** {}",
            a.source, ts, a.category
        ));
        lines.push(format!("**URL:** {}", a.url));
        if !a.summary.is_empty() {
            lines.push(format!("> {}", truncate_chars(&a.summary, 200)));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}
