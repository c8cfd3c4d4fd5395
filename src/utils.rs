//! Shared helpers: relative-time parsing, HTML stripping, safe truncation,
//! and atomic file writes for the small persistent stores.

use std::error::Error;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use scraper::Html;

/// Parse a relative time window like `"30m"`, `"2h"`, `"1d"`, `"1w"` into the
/// cutoff instant `now - window`.
///
/// # Errors
///
/// Returns an error for an empty string, a non-numeric quantity, or an
/// unknown unit suffix. This is a configuration error and is surfaced before
/// the crawl starts.
pub fn parse_since(value: &str) -> Result<DateTime<Utc>, Box<dyn Error + Send + Sync>> {
    let value = value.trim().to_lowercase();
    if value.len() < 2 {
        return Err(format!("invalid time window: {value:?}").into());
    }
    let (amount, unit) = value.split_at(value.len() - 1);
    let amount: i64 = amount
        .parse()
        .map_err(|_| format!("invalid time quantity in {value:?}"))?;
    let window = match unit {
        "m" => Duration::minutes(amount),
        "h" => Duration::hours(amount),
        "d" => Duration::days(amount),
        "w" => Duration::weeks(amount),
        other => return Err(format!("unknown time unit {other:?} in {value:?}").into()),
    };
    Ok(Utc::now() - window)
}

/// Parse a TTL value: either bare seconds (`"600"`) or a suffixed window
/// (`"30m"`, `"48h"`, `"2d"`).
pub fn parse_window_secs(value: &str) -> Result<u64, Box<dyn Error + Send + Sync>> {
    let value = value.trim().to_lowercase();
    if let Ok(secs) = value.parse::<u64>() {
        return Ok(secs);
    }
    if value.len() < 2 {
        return Err(format!("invalid window: {value:?}").into());
    }
    let (amount, unit) = value.split_at(value.len() - 1);
    let amount: u64 = amount
        .parse()
        .map_err(|_| format!("invalid quantity in {value:?}"))?;
    let secs = match unit {
        "s" => amount,
        "m" => amount * 60,
        "h" => amount * 3600,
        "d" => amount * 86_400,
        "w" => amount * 604_800,
        other => return Err(format!("unknown window unit {other:?}").into()),
    };
    Ok(secs)
}

/// Strip HTML tags from a feed summary, collapsing whitespace.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters, appending `...` when clipped.
/// Operates on char boundaries so multi-byte text never splits.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let clipped: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", clipped.trim_end())
}

/// Truncate a string for logging with a byte-count indicator.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…(+{} bytes)", &s[..end], s.len() - end)
    }
}

/// Write a file atomically: write to a sibling temp file, then rename over
/// the destination. Creates parent directories as needed.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_since_units() {
        let now = Utc::now();
        let cutoff = parse_since("2h").unwrap();
        let delta = now - cutoff;
        assert!((delta.num_minutes() - 120).abs() <= 1);

        assert!(parse_since("30m").is_ok());
        assert!(parse_since("1d").is_ok());
        assert!(parse_since("1w").is_ok());
    }

    #[test]
    fn test_parse_since_rejects_garbage() {
        assert!(parse_since("").is_err());
        assert!(parse_since("h").is_err());
        assert!(parse_since("abc").is_err());
        assert!(parse_since("5y").is_err());
    }

    #[test]
    fn test_parse_window_secs() {
        assert_eq!(parse_window_secs("600").unwrap(), 600);
        assert_eq!(parse_window_secs("30m").unwrap(), 1800);
        assert_eq!(parse_window_secs("48h").unwrap(), 172_800);
        assert_eq!(parse_window_secs("2d").unwrap(), 172_800);
        assert!(parse_window_secs("abc").is_err());
        assert!(parse_window_secs("").is_err());
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Hello <b>world</b></p>  <br/>again"),
            "Hello world again"
        );
        assert_eq!(strip_html("plain text"), "plain text");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        let long = "a".repeat(400);
        let clipped = truncate_chars(&long, 300);
        assert_eq!(clipped.chars().count(), 300);
        assert!(clipped.ends_with("..."));
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("hello", 100), "hello");
        let s = "a".repeat(500);
        let out = truncate_for_log(&s, 100);
        assert!(out.starts_with(&"a".repeat(100)));
        assert!(out.contains("(+400 bytes)"));
    }

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/file.json");
        write_atomic(&path, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }
}
