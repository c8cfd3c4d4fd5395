//! Three-stage deduplication engine.
//!
//! A single pass over the input batch applies three checks of increasing
//! cost, all sharing one index of emitted articles and one quality-aware
//! replace-or-drop rule:
//!
//! 1. **exact**: md5 over normalized title + canonical URL
//! 2. **fingerprint**: md5 over the significant-word set of the title
//! 3. **fuzzy**: similarity ratio against every emitted title, guarded by
//!    cheap length-band and word-overlap prefilters
//!
//! When a later, higher-quality article supplants an earlier duplicate it
//! takes the earlier one's position in the output, and the fuzzy index entry
//! for that slot is rewritten so subsequent candidates match the replacement's
//! title rather than the dropped one's.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::models::{significant_words, Article};

/// Dedup pass configuration.
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Fuzzy similarity threshold in `[0, 1]`; a ratio strictly above this
    /// marks a duplicate.
    pub threshold: f64,
    /// When false the pass is a no-op that still reports input/output counts.
    pub enabled: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { threshold: 0.75, enabled: true }
    }
}

/// Counters describing one dedup pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupStats {
    pub total_input: usize,
    pub exact_dupes: usize,
    pub fingerprint_dupes: usize,
    pub fuzzy_dupes: usize,
    pub unique_output: usize,
}

impl DedupStats {
    /// Articles removed across all three stages.
    pub fn total_removed(&self) -> usize {
        self.exact_dupes + self.fingerprint_dupes + self.fuzzy_dupes
    }

    /// One-line summary, e.g. `"120 → 97 (removed 23)"`.
    pub fn summary(&self) -> String {
        format!(
            "{} → {} (removed {})",
            self.total_input,
            self.unique_output,
            self.total_removed()
        )
    }
}

/// Fuzzy-stage index entry for one emitted output slot.
struct FuzzyEntry {
    title: String,
    len: usize,
    words: std::collections::BTreeSet<String>,
}

impl FuzzyEntry {
    fn for_article(article: &Article) -> Self {
        let title = article.title.trim().to_lowercase();
        Self {
            len: title.chars().count(),
            words: significant_words(&title),
            title,
        }
    }
}

/// Collapse duplicates in a batch, preserving input order.
///
/// Output invariants: no two emitted articles share a `dedup_key` or a
/// `title_fingerprint`; for every equivalence class the emitted
/// representative has the highest `quality_score` of its members and sits at
/// the position where the class first appeared; survivors count contributing
/// sources in `source_count`. The pass is idempotent.
pub fn deduplicate(articles: Vec<Article>, config: &DedupConfig) -> (Vec<Article>, DedupStats) {
    let mut stats = DedupStats { total_input: articles.len(), ..Default::default() };

    if !config.enabled {
        stats.unique_output = articles.len();
        return (articles, stats);
    }

    let mut output: Vec<Article> = Vec::with_capacity(articles.len());
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut by_fingerprint: HashMap<String, usize> = HashMap::new();
    // Parallel to `output`: fuzzy[i] describes the title occupying slot i.
    let mut fuzzy: Vec<FuzzyEntry> = Vec::new();

    for article in articles {
        // Stage 1: exact key.
        let key = article.dedup_key();
        if let Some(&slot) = by_key.get(&key) {
            stats.exact_dupes += 1;
            resolve_duplicate(slot, article, &mut output, &mut by_key, &mut by_fingerprint, &mut fuzzy);
            continue;
        }

        // Stage 2: title fingerprint. Titles with fewer than two significant
        // words have no fingerprint and skip this stage.
        let fingerprint = article.title_fingerprint();
        if let Some(fp) = &fingerprint {
            if let Some(&slot) = by_fingerprint.get(fp) {
                stats.fingerprint_dupes += 1;
                resolve_duplicate(slot, article, &mut output, &mut by_key, &mut by_fingerprint, &mut fuzzy);
                continue;
            }
        }

        // Stage 3: fuzzy title similarity with cheap prefilters.
        let candidate = FuzzyEntry::for_article(&article);
        let mut matched_slot = None;
        for (slot, entry) in fuzzy.iter().enumerate() {
            let max_len = entry.len.max(candidate.len);
            let diff = entry.len.abs_diff(candidate.len);
            if diff as f64 > max_len as f64 * (1.0 - config.threshold) {
                continue;
            }
            if !candidate.words.is_empty()
                && !entry.words.is_empty()
                && candidate.words.intersection(&entry.words).next().is_none()
            {
                continue;
            }
            if similarity_ratio(&candidate.title, &entry.title) > config.threshold {
                matched_slot = Some(slot);
                break;
            }
        }

        if let Some(slot) = matched_slot {
            stats.fuzzy_dupes += 1;
            resolve_duplicate(slot, article, &mut output, &mut by_key, &mut by_fingerprint, &mut fuzzy);
            continue;
        }

        // Unique: emit and index.
        let slot = output.len();
        by_key.insert(key, slot);
        if let Some(fp) = fingerprint {
            by_fingerprint.insert(fp, slot);
        }
        fuzzy.push(candidate);
        output.push(article);
    }

    stats.unique_output = output.len();
    debug!(
        input = stats.total_input,
        output = stats.unique_output,
        exact = stats.exact_dupes,
        fingerprint = stats.fingerprint_dupes,
        fuzzy = stats.fuzzy_dupes,
        "dedup pass complete"
    );
    (output, stats)
}

/// Apply the quality-aware replace-or-drop rule for a duplicate of the
/// article occupying `slot`.
///
/// The newcomer replaces the incumbent only with strictly higher quality; the
/// output slot never moves. Either way the newcomer's identities are
/// registered against the slot so later variants of the losing form still hit
/// the cheap stages, and on replacement the fuzzy index entry is rewritten to
/// the surviving title.
fn resolve_duplicate(
    slot: usize,
    mut newcomer: Article,
    output: &mut [Article],
    by_key: &mut HashMap<String, usize>,
    by_fingerprint: &mut HashMap<String, usize>,
    fuzzy: &mut [FuzzyEntry],
) {
    let incumbent = &output[slot];
    let cross_source = newcomer.source != incumbent.source;
    let merged_sources = incumbent.source_count + u32::from(cross_source);

    by_key.insert(newcomer.dedup_key(), slot);
    if let Some(fp) = newcomer.title_fingerprint() {
        by_fingerprint.insert(fp, slot);
    }

    if newcomer.quality_score > incumbent.quality_score {
        newcomer.source_count = merged_sources;
        fuzzy[slot] = FuzzyEntry::for_article(&newcomer);
        output[slot] = newcomer;
    } else {
        output[slot].source_count = merged_sources;
    }
}

/// Similarity of two strings as `2·LCS / (len_a + len_b)`, the classical
/// string-matching ratio. Returns a value in `[0, 1]`.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Two-row LCS table.
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let lcs = prev[b.len()];
    2.0 * lcs as f64 / (a.len() + b.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, url: &str, quality: f64) -> Article {
        let mut a = Article::new(title, url, "Test");
        a.quality_score = quality;
        a
    }

    #[test]
    fn test_similarity_ratio_bounds() {
        assert_eq!(similarity_ratio("same", "same"), 1.0);
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("abc", ""), 0.0);
        assert!(similarity_ratio("abcdef", "uvwxyz") < 0.2);
    }

    #[test]
    fn test_exact_dedup() {
        let input = vec![
            article("Hello", "https://a.com/1", 0.5),
            article("Hello", "https://a.com/1", 0.5),
        ];
        let (out, stats) = deduplicate(input, &DedupConfig::default());
        assert_eq!(out.len(), 1);
        assert_eq!(stats.exact_dupes, 1);
        assert_eq!(stats.summary(), "2 → 1 (removed 1)");
    }

    #[test]
    fn test_exact_dedup_prefers_quality() {
        let input = vec![
            article("Hello", "https://a.com/1", 0.4),
            {
                let mut a = article("Hello", "https://a.com/1", 0.9);
                a.summary = "richer".to_string();
                a
            },
        ];
        let (out, _) = deduplicate(input, &DedupConfig::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].quality_score, 0.9);
        assert_eq!(out[0].summary, "richer");
    }

    #[test]
    fn test_fingerprint_dedup_catches_reordered_titles() {
        let input = vec![
            article("Rust compiler gains incremental builds", "https://a.com/1", 0.5),
            article("Incremental builds gains Rust compiler", "https://b.com/2", 0.5),
        ];
        let (out, stats) = deduplicate(input, &DedupConfig::default());
        assert_eq!(out.len(), 1);
        assert_eq!(stats.fingerprint_dupes, 1);
        assert_eq!(out[0].url, "https://a.com/1");
    }

    #[test]
    fn test_fuzzy_replace_updates_index() {
        let mut a1 = article("Major earthquake strikes California coast today", "https://a.com/1", 0.3);
        a1.source = "One".to_string();
        let mut a2 = article("Major earthquake strikes California coast", "https://b.com/2", 0.9);
        a2.source = "Two".to_string();
        let mut a3 = article("Major earthquake strikes California coast tonight", "https://c.com/3", 0.5);
        a3.source = "Three".to_string();

        let (out, stats) = deduplicate(vec![a1, a2, a3], &DedupConfig { threshold: 0.75, enabled: true });
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://b.com/2");
        assert_eq!(stats.fuzzy_dupes, 2);
    }

    #[test]
    fn test_replacement_keeps_output_slot() {
        let input = vec![
            article("Unrelated story about gardening tips", "https://g.com/1", 0.5),
            article("Server outage disrupts cloud provider", "https://a.com/1", 0.3),
            article("Another unrelated story about cooking", "https://k.com/1", 0.5),
            article("Server outage disrupts cloud provider", "https://a.com/1", 0.9),
        ];
        let (out, _) = deduplicate(input, &DedupConfig::default());
        assert_eq!(out.len(), 3);
        // The higher-quality replacement occupies the original slot 1.
        assert_eq!(out[1].quality_score, 0.9);
        assert_eq!(out[1].title, "Server outage disrupts cloud provider");
    }

    #[test]
    fn test_source_count_increments_across_sources() {
        let mut a = article("Big merger announced between rivals", "https://a.com/1", 0.5);
        a.source = "Alpha".to_string();
        let mut b = article("Big merger announced between rivals", "https://a.com/1", 0.4);
        b.source = "Beta".to_string();
        let mut c = article("Big merger announced between rivals", "https://a.com/1", 0.4);
        c.source = "Alpha".to_string();

        let (out, _) = deduplicate(vec![a, b, c], &DedupConfig::default());
        assert_eq!(out.len(), 1);
        // Beta adds a second source; the repeat from Alpha does not.
        assert_eq!(out[0].source_count, 2);
    }

    #[test]
    fn test_disabled_passthrough() {
        let input = vec![
            article("Hello", "https://a.com/1", 0.5),
            article("Hello", "https://a.com/1", 0.5),
        ];
        let (out, stats) = deduplicate(input, &DedupConfig { threshold: 0.75, enabled: false });
        assert_eq!(out.len(), 2);
        assert_eq!(stats.total_input, 2);
        assert_eq!(stats.unique_output, 2);
        assert_eq!(stats.total_removed(), 0);
    }

    #[test]
    fn test_order_preserved_without_duplicates() {
        let input = vec![
            article("Completely distinct alpha headline", "https://a.com/1", 0.5),
            article("Something else entirely about beta", "https://b.com/2", 0.5),
            article("Gamma rays detected from deep space", "https://c.com/3", 0.5),
        ];
        let urls: Vec<String> = input.iter().map(|a| a.url.clone()).collect();
        let (out, stats) = deduplicate(input, &DedupConfig::default());
        assert_eq!(out.iter().map(|a| a.url.clone()).collect::<Vec<_>>(), urls);
        assert_eq!(stats.total_removed(), 0);
    }

    #[test]
    fn test_dedup_idempotent() {
        let input = vec![
            article("Major earthquake strikes California coast today", "https://a.com/1", 0.3),
            article("Major earthquake strikes California coast", "https://b.com/2", 0.9),
            article("Completely distinct alpha headline", "https://c.com/3", 0.5),
            article("Completely distinct alpha headline", "https://c.com/3", 0.5),
        ];
        let config = DedupConfig::default();
        let (once, _) = deduplicate(input, &config);
        let (twice, stats) = deduplicate(once.clone(), &config);
        assert_eq!(once.len(), twice.len());
        assert_eq!(stats.total_removed(), 0);
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.url, b.url);
        }
    }

    #[test]
    fn test_quality_monotone() {
        let input = vec![
            article("Breaking news about the economy today", "https://a.com/1", 0.2),
            article("Breaking news about the economy today", "https://a.com/1", 0.7),
            article("Breaking news about the economy today", "https://a.com/1", 0.5),
        ];
        let (out, _) = deduplicate(input, &DedupConfig::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].quality_score, 0.7);
    }
}
