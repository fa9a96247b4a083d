use std::collections::BTreeSet;

use crate::domain::Finding;

/// Pluggable textual similarity over normalized summaries, scored in [0, 1].
pub trait SummarySimilarity: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f32;
}

/// Token-set Jaccard similarity. Cheap, symmetric, and good enough to
/// catch two paraphrases of the same clause; swap the trait impl to move
/// to embedding cosine without touching the deduplicator.
pub struct JaccardSimilarity;

impl SummarySimilarity for JaccardSimilarity {
    fn score(&self, a: &str, b: &str) -> f32 {
        let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
        let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

        if tokens_a.is_empty() && tokens_b.is_empty() {
            return 1.0;
        }

        let intersection = tokens_a.intersection(&tokens_b).count();
        let union = tokens_a.union(&tokens_b).count();
        intersection as f32 / union as f32
    }
}

/// Lowercases, strips punctuation and collapses whitespace so trivially
/// restyled summaries compare equal.
pub fn normalize_summary(summary: &str) -> String {
    summary
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Merges candidate findings that describe the same underlying clause.
///
/// Two findings are duplicates when they share a category, their page
/// ranges overlap, and their summaries are the same after normalization or
/// similar beyond the configured threshold. The survivor is the
/// higher-severity finding, ties broken by confidence. Runs once per
/// document after all chunks are analyzed; the result is independent of
/// candidate arrival order and stable under re-runs.
pub struct Deduplicator {
    similarity: Box<dyn SummarySimilarity>,
    threshold: f32,
}

impl Deduplicator {
    pub fn new(similarity: Box<dyn SummarySimilarity>, threshold: f32) -> Self {
        Self {
            similarity,
            threshold,
        }
    }

    #[tracing::instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub fn deduplicate(&self, mut candidates: Vec<Finding>) -> Vec<Finding> {
        // Strongest first, with a total order so arrival order is
        // irrelevant and re-running yields the same survivors.
        candidates.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(ordered(b.confidence).cmp(&ordered(a.confidence)))
                .then(a.summary.cmp(&b.summary))
        });

        let mut survivors: Vec<Finding> = Vec::with_capacity(candidates.len());
        let mut dropped = 0usize;

        for candidate in candidates {
            let duplicate_of = survivors.iter().find(|kept| self.is_duplicate(kept, &candidate));
            match duplicate_of {
                Some(kept) => {
                    dropped += 1;
                    tracing::debug!(
                        kept = %kept.id,
                        dropped_summary = %candidate.summary,
                        "Merged duplicate finding"
                    );
                }
                None => survivors.push(candidate),
            }
        }

        tracing::info!(survivors = survivors.len(), dropped, "Deduplication complete");
        survivors
    }

    fn is_duplicate(&self, a: &Finding, b: &Finding) -> bool {
        if a.category != b.category || !a.pages_overlap(b) {
            return false;
        }

        let norm_a = normalize_summary(&a.summary);
        let norm_b = normalize_summary(&b.summary);
        if norm_a == norm_b {
            return true;
        }

        self.similarity.score(&norm_a, &norm_b) >= self.threshold
    }
}

/// f32 confidence as a totally ordered key (confidence is always finite
/// and in [0, 1] by construction).
fn ordered(confidence: f32) -> u32 {
    (confidence * 1_000_000.0) as u32
}
