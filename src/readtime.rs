//! Reading-time estimation from headline + summary.
//!
//! Only metadata is available (never full text), so the word count is a
//! proxy scaled by 3× to account for summaries being much shorter than the
//! articles they describe. Base speed is 200 WPM for technical content.

use crate::models::Article;

/// Words per minute assumed for technical content.
const WPM: usize = 200;

/// Estimate reading time in whole minutes.
///
/// Short metadata (<50 words) maps to a 2-minute brief; mid-length to at
/// least 3 minutes; long summaries scale with the word count, floored at 5.
pub fn estimate_read_minutes(article: &Article) -> usize {
    let text = format!("{} {}", article.title, article.summary);
    let words = text.split_whitespace().count();

    let scaled = ((words * 3) as f64 / WPM as f64).round() as usize;
    if words < 50 {
        2
    } else if words < 150 {
        scaled.max(3)
    } else {
        scaled.max(5)
    }
}

/// Human form, e.g. `"4 min read"`.
pub fn format_read_time(minutes: usize) -> String {
    if minutes < 1 {
        "<1 min".to_string()
    } else {
        format!("{minutes} min read")
    }
}

/// Keep articles whose estimated reading time falls inside the inclusive
/// window. `None` bounds are open.
pub fn filter_by_read_time(
    articles: Vec<Article>,
    min_minutes: Option<usize>,
    max_minutes: Option<usize>,
) -> Vec<Article> {
    if min_minutes.is_none() && max_minutes.is_none() {
        return articles;
    }
    articles
        .into_iter()
        .filter(|a| {
            let rt = estimate_read_minutes(a);
            if min_minutes.is_some_and(|min| rt < min) {
                return false;
            }
            if max_minutes.is_some_and(|max| rt > max) {
                return false;
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_words(n: usize) -> Article {
        let mut a = Article::new("t", "https://a.com/1", "A");
        a.summary = vec!["word"; n.saturating_sub(1)].join(" ");
        a
    }

    #[test]
    fn test_short_text_is_two_minutes() {
        assert_eq!(estimate_read_minutes(&with_words(10)), 2);
        assert_eq!(estimate_read_minutes(&with_words(49)), 2);
    }

    #[test]
    fn test_medium_text_floors_at_three() {
        assert_eq!(estimate_read_minutes(&with_words(60)), 3);
        // 140 words * 3 / 200 = 2.1 → floor applies.
        assert_eq!(estimate_read_minutes(&with_words(140)), 3);
    }

    #[test]
    fn test_long_text_scales() {
        // 400 words * 3 / 200 = 6.
        assert_eq!(estimate_read_minutes(&with_words(400)), 6);
        // 160 words * 3 / 200 = 2.4 → floor of 5 applies.
        assert_eq!(estimate_read_minutes(&with_words(160)), 5);
    }

    #[test]
    fn test_filter_window() {
        let input = vec![with_words(10), with_words(400)];
        let short_only = filter_by_read_time(input.clone(), None, Some(3));
        assert_eq!(short_only.len(), 1);
        let long_only = filter_by_read_time(input.clone(), Some(5), None);
        assert_eq!(long_only.len(), 1);
        let all = filter_by_read_time(input, None, None);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_read_time(0), "<1 min");
        assert_eq!(format_read_time(4), "4 min read");
    }
}
