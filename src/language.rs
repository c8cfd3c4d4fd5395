//! Lightweight language detection over article title + summary.
//!
//! Script-based checks run first (high confidence: Japanese kana, Hangul,
//! CJK, Cyrillic, Arabic), then a stop-word frequency score across a small
//! per-language function-word list handles Latin-script languages. A minimum
//! match ratio of 0.05 is required, otherwise the article is `unknown`.
//! `unknown` always passes an include filter: only positively detected
//! languages are ever dropped by `--lang`.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Article;

/// High-frequency function words per language.
static LANG_WORDS: Lazy<HashMap<&'static str, HashSet<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "en",
        HashSet::from([
            "the", "and", "for", "that", "with", "this", "from", "have", "has", "are", "was",
            "were", "been", "will", "would", "could", "should", "about", "into", "more", "your",
            "their", "which", "when", "what", "than", "after", "before", "also", "just", "how",
            "its", "over",
        ]),
    );
    m.insert(
        "es",
        HashSet::from([
            "que", "los", "las", "del", "por", "con", "una", "para", "como", "pero", "sus",
            "más", "este", "esta", "ser", "entre", "cuando", "muy", "sin", "sobre", "también",
            "hasta", "desde", "donde",
        ]),
    );
    m.insert(
        "fr",
        HashSet::from([
            "les", "des", "une", "que", "est", "dans", "pour", "qui", "sur", "pas", "plus",
            "par", "avec", "son", "sont", "mais", "ont", "ses", "aux", "cette", "tout", "nous",
            "vous", "leur", "entre", "après",
        ]),
    );
    m.insert(
        "de",
        HashSet::from([
            "der", "die", "und", "den", "von", "das", "ist", "des", "auf", "für", "mit", "sich",
            "dem", "nicht", "ein", "eine", "als", "auch", "nach", "wie", "aus", "bei", "oder",
            "nur", "noch",
        ]),
    );
    m.insert(
        "pt",
        HashSet::from([
            "que", "para", "com", "uma", "dos", "por", "não", "mais", "como", "mas", "foi",
            "são", "sua", "seu", "das", "nos", "entre", "pelo", "tem", "ser", "está", "sobre",
            "também", "quando", "muito",
        ]),
    );
    m.insert(
        "it",
        HashSet::from([
            "che", "per", "una", "del", "con", "non", "sono", "della", "anche", "più", "suo",
            "sua", "dei", "dal", "gli", "nel", "alla", "questo", "essere", "come", "stato",
            "tra", "dopo", "tutto", "molto",
        ]),
    );
    m.insert(
        "nl",
        HashSet::from([
            "het", "een", "van", "dat", "met", "voor", "zijn", "maar", "niet", "ook", "nog",
            "uit", "naar", "wel", "dan", "hun", "alle", "deze",
        ]),
    );
    m
});

static CJK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x{4e00}-\x{9fff}\x{3400}-\x{4dbf}]").unwrap());
static KANA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x{3040}-\x{309f}\x{30a0}-\x{30ff}]").unwrap());
static HANGUL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x{ac00}-\x{d7af}\x{1100}-\x{11ff}]").unwrap());
static CYRILLIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x{0400}-\x{04ff}]").unwrap());
static ARABIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x{0600}-\x{06ff}]").unwrap());
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zà-öø-ÿ]+").unwrap());

/// Detect the probable language of an article.
///
/// Returns an ISO 639-1 code (`en`, `es`, `fr`, `de`, `pt`, `it`, `nl`,
/// `zh`, `ja`, `ko`, `ru`, `ar`) or `unknown`.
pub fn detect_language(article: &Article) -> &'static str {
    let text = format!("{} {}", article.title, article.summary);
    let total_chars = text.chars().count().max(1);

    if KANA_RE.is_match(&text) {
        return "ja";
    }
    if HANGUL_RE.is_match(&text) {
        return "ko";
    }
    if CJK_RE.find_iter(&text).count() as f64 > total_chars as f64 * 0.1 {
        return "zh";
    }
    if CYRILLIC_RE.find_iter(&text).count() as f64 > total_chars as f64 * 0.15 {
        return "ru";
    }
    if ARABIC_RE.find_iter(&text).count() as f64 > total_chars as f64 * 0.15 {
        return "ar";
    }

    let lower = text.to_lowercase();
    let words: Vec<&str> = WORD_RE.find_iter(&lower).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return "unknown";
    }

    let mut best: (&'static str, f64) = ("unknown", 0.0);
    for (lang, stopwords) in LANG_WORDS.iter() {
        let matches = words.iter().filter(|w| stopwords.contains(*w)).count();
        let score = matches as f64 / words.len() as f64;
        if score > best.1 {
            best = (lang, score);
        }
    }

    if best.1 < 0.05 { "unknown" } else { best.0 }
}

/// Filter articles by detected language.
///
/// `lang` and `exclude_lang` are comma-separated code lists. Articles whose
/// detection is `unknown` pass an include filter; exclusion drops only exact
/// detected codes.
pub fn filter_by_language(
    articles: Vec<Article>,
    lang: Option<&str>,
    exclude_lang: Option<&str>,
) -> Vec<Article> {
    if lang.is_none() && exclude_lang.is_none() {
        return articles;
    }
    let include: Option<HashSet<String>> = lang.map(csv_set);
    let exclude: HashSet<String> = exclude_lang.map(csv_set).unwrap_or_default();

    articles
        .into_iter()
        .filter(|a| {
            let detected = detect_language(a);
            if exclude.contains(detected) {
                return false;
            }
            if let Some(include) = &include {
                if detected != "unknown" && !include.contains(detected) {
                    return false;
                }
            }
            true
        })
        .collect()
}

fn csv_set(csv: &str) -> HashSet<String> {
    csv.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
