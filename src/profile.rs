//! Interest-profile relevance scoring.
//!
//! A profile is a set of weighted keyword groups, loaded from YAML or JSON:
//!
//! ```yaml
//! name: Alexandria
//! interests:
//!   - keywords: [AI, machine learning, LLM]
//!     weight: 2.0
//!   - keywords: [rust, typescript, open source]
//!     weight: 1.0
//! ```
//!
//! Articles are scored by keyword matches in title + summary with diminishing
//! returns inside a group, normalized to `[0, 1]` against the batch maximum,
//! and re-sorted by relevance.

use std::error::Error;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::models::Article;

/// A weighted group of related interest keywords.
#[derive(Debug, Clone, Deserialize)]
pub struct InterestGroup {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// A user interest profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub interests: Vec<InterestGroup>,
}

/// Load a profile from a `.yaml`/`.yml` or `.json` file.
///
/// # Errors
///
/// Missing files, unsupported extensions, and malformed content are
/// configuration errors, raised before the crawl starts.
pub fn load_profile(path: &str) -> Result<Profile, Box<dyn Error + Send + Sync>> {
    let p = Path::new(path);
    let content = std::fs::read_to_string(p)
        .map_err(|e| format!("profile not found: {path}: {e}"))?;
    match p.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        Some("json") => Ok(serde_json::from_str(&content)?),
        other => Err(format!("unsupported profile format: {other:?}").into()),
    }
}

/// Build a profile from a shorthand interests string such as
/// `"AI, rust, skateboarding"`: one group per comma token, weight 1.0.
pub fn interests_to_profile(interests: &str) -> Profile {
    let groups = interests
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|kw| InterestGroup { keywords: vec![kw.to_string()], weight: 1.0 })
        .collect();
    Profile { name: None, interests: groups }
}

fn score_article(article: &Article, interests: &[InterestGroup]) -> f64 {
    let text = format!("{} {}", article.title, article.summary).to_lowercase();
    let mut total = 0.0;
    for group in interests {
        let hits = group
            .keywords
            .iter()
            .filter(|kw| !kw.is_empty() && text.contains(&kw.to_lowercase()))
            .count();
        if hits > 0 {
            // Diminishing returns for multiple hits in the same group.
            total += group.weight * (1.0 + 0.3 * (hits - 1) as f64);
        }
    }
    total
}

/// Score and re-sort articles by relevance to a profile.
///
/// Sets `relevance` on every article (raw score divided by the batch
/// maximum), drops articles below `min_relevance`, and sorts descending.
/// A profile without interests returns the input unchanged.
pub fn score_articles(articles: Vec<Article>, profile: &Profile, min_relevance: f64) -> Vec<Article> {
    if profile.interests.is_empty() {
        warn!("profile has no interests; returning articles unsorted");
        return articles;
    }

    let mut scored: Vec<(Article, f64)> = articles
        .into_iter()
        .map(|a| {
            let raw = score_article(&a, &profile.interests);
            (a, raw)
        })
        .collect();

    let max = scored.iter().map(|(_, s)| *s).fold(0.0_f64, f64::max);
    let max = if max > 0.0 { max } else { 1.0 };

    let mut result: Vec<Article> = scored
        .iter_mut()
        .filter_map(|(article, raw)| {
            let relevance = *raw / max;
            if relevance < min_relevance {
                return None;
            }
            let mut article = article.clone();
            article.relevance = Some(relevance);
            Some(article)
        })
        .collect();

    result.sort_by(|a, b| {
        b.relevance
            .unwrap_or(0.0)
            .total_cmp(&a.relevance.unwrap_or(0.0))
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, summary: &str) -> Article {
        let mut a = Article::new(title, "https://a.com/1", "A");
        a.summary = summary.to_string();
        a
    }

    fn rust_ai_profile() -> Profile {
        Profile {
            name: None,
            interests: vec![
                InterestGroup { keywords: vec!["rust".into(), "cargo".into()], weight: 2.0 },
                InterestGroup { keywords: vec!["ai".into()], weight: 1.0 },
            ],
        }
    }

    #[test]
    fn test_normalization_against_batch_max() {
        let profile = rust_ai_profile();
        let input = vec![
            article("Rust and cargo news", ""),   // 2.0 * 1.3 = 2.6
            article("Nothing relevant here", ""), // 0.0
        ];
        let out = score_articles(input, &profile, 0.0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].relevance, Some(1.0));
        assert_eq!(out[1].relevance, Some(0.0));
    }

    #[test]
    fn test_diminishing_returns_within_group() {
        let profile = rust_ai_profile();
        let both = score_article(&article("rust cargo update", ""), &profile.interests);
        let one = score_article(&article("rust update", ""), &profile.interests);
        assert!(both > one);
        assert!(both < one * 2.0, "second hit in a group must not double the score");
    }

    #[test]
    fn test_sorted_by_relevance_desc() {
        let profile = rust_ai_profile();
        let input = vec![
            article("Unrelated piece", ""),
            article("AI summit report", ""),
            article("Rust release announced", ""),
        ];
        let out = score_articles(input, &profile, 0.0);
        let relevances: Vec<f64> = out.iter().map(|a| a.relevance.unwrap()).collect();
        assert!(relevances.windows(2).all(|w| w[0] >= w[1]));
        assert!(out[0].title.contains("Rust"));
    }

    #[test]
    fn test_min_relevance_filters() {
        let profile = rust_ai_profile();
        let input = vec![
            article("Rust release announced", ""),
            article("Unrelated piece", ""),
        ];
        let out = score_articles(input, &profile, 0.5);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_empty_interests_returns_unchanged() {
        let input = vec![article("B story", ""), article("A story", "")];
        let out = score_articles(input, &Profile::default(), 0.0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "B story");
        assert_eq!(out[0].relevance, None);
    }

    #[test]
    fn test_interests_shorthand() {
        let profile = interests_to_profile("AI, rust, skateboarding");
        assert_eq!(profile.interests.len(), 3);
        assert!(profile.interests.iter().all(|g| g.weight == 1.0));
        assert_eq!(profile.interests[1].keywords, vec!["rust"]);
    }

    #[test]
    fn test_load_profile_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interests.yaml");
        std::fs::write(
            &path,
            "name: Test\ninterests:\n  - keywords: [AI, LLM]\n    weight: 2.0\n",
        )
        .unwrap();
        let profile = load_profile(path.to_str().unwrap()).unwrap();
        assert_eq!(profile.name.as_deref(), Some("Test"));
        assert_eq!(profile.interests[0].weight, 2.0);
    }

    #[test]
    fn test_load_profile_missing_is_error() {
        assert!(load_profile("/nonexistent/interests.yaml").is_err());
    }
}
