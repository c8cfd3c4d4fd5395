//! Keyword-based tone classification.
//!
//! Classifies each article as `positive`, `negative`, or `neutral` from
//! keyword hits in the title (weighted 3×) and summary (1×). Useful for
//! surfacing constructive news or dropping doom-scroll material via
//! `--no-doom`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Article;

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "breakthrough", "launch", "launched", "launches", "innovation", "innovate", "milestone",
        "award", "awarded", "success", "successful", "achieve", "achievement", "discover",
        "discovered", "discovery", "cure", "solution", "improve", "improved", "improvement",
        "grow", "growth", "record-breaking", "celebrate", "exciting", "open-source", "free",
        "release", "released", "upgrade", "progress", "win", "winning", "won", "partnership",
        "fund", "funded", "funding", "grant", "save", "saved", "rescue", "rescued", "volunteer",
        "donate", "donation", "community", "empower", "thrive",
    ])
});

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "crash", "crisis", "disaster", "catastrophe", "catastrophic", "collapse", "collapsed",
        "kill", "killed", "killing", "death", "dead", "die", "dies", "attack", "attacked",
        "war", "bomb", "bombing", "explosion", "explode", "threat", "threaten", "hack",
        "hacked", "breach", "breached", "leak", "leaked", "scandal", "fraud", "scam", "arrest",
        "arrested", "prison", "jail", "lawsuit", "layoff", "layoffs", "fired", "shutdown",
        "bankrupt", "bankruptcy", "recession", "decline", "plunge", "plunged", "suffer",
        "victim", "devastate", "devastating", "surge", "worst", "fail", "failed", "failure",
        "warning", "danger", "dangerous", "toxic", "pollution",
    ])
});

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+(?:-[a-z]+)*").unwrap());

fn word_set(text: &str) -> HashSet<String> {
    WORD_RE
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Classify an article's tone as `"positive"`, `"negative"`, or `"neutral"`.
///
/// The winning polarity needs a strict majority and a score of at least 2;
/// anything weaker is `neutral`.
pub fn classify_tone(article: &Article) -> &'static str {
    let title_words = word_set(&article.title);
    let summary_words = word_set(&article.summary);

    let pos = title_words.iter().filter(|w| POSITIVE_WORDS.contains(w.as_str())).count() * 3
        + summary_words.iter().filter(|w| POSITIVE_WORDS.contains(w.as_str())).count();
    let neg = title_words.iter().filter(|w| NEGATIVE_WORDS.contains(w.as_str())).count() * 3
        + summary_words.iter().filter(|w| NEGATIVE_WORDS.contains(w.as_str())).count();

    if pos > neg && pos >= 2 {
        "positive"
    } else if neg > pos && neg >= 2 {
        "negative"
    } else {
        "neutral"
    }
}

/// Filter articles by tone. `tone` keeps only the matching classification;
/// `no_doom` drops `negative` articles. Both unset is a no-op.
pub fn filter_by_tone(articles: Vec<Article>, tone: Option<&str>, no_doom: bool) -> Vec<Article> {
    if tone.is_none() && !no_doom {
        return articles;
    }
    articles
        .into_iter()
        .filter(|a| {
            let t = classify_tone(a);
            if no_doom && t == "negative" {
                return false;
            }
            if let Some(wanted) = tone {
                return t == wanted;
            }
            true
        })
        .collect()
}
