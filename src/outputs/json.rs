//! JSON output: the full article schema, pretty-printed.

use tracing::error;

use crate::models::Article;

/// Render articles as a pretty JSON array.
pub fn format(articles: &[Article]) -> String {
    match serde_json::to_string_pretty(articles) {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "failed to serialize articles");
            "[]".to_string()
        }
    }
}
