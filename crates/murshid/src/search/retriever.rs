//! Ranked Retrieval
//!
//! Selects which datasets to scan for an intent, scores every record in
//! them and returns the retained candidates in rank order. The targeted
//! dataset is searched at full priority and the others at reduced — never
//! zero — priority, so a strong textual match in a sibling dataset can
//! still surface.

use crate::config::{RetrievalConfig, ScoringWeights};
use crate::context::ConversationContext;
use crate::intent::IntentAnalysis;
use crate::search::scorer::{score_record, QueryFeatures};
use crate::store::DatasetBundle;
use crate::types::{DatasetKind, ScoredCandidate};

/// Priority of the targeted dataset.
const PRIMARY_PRIORITY: f32 = 3.0;
/// Priority of every dataset when no intent targets one.
const NEUTRAL_PRIORITY: f32 = 2.0;

/// Datasets to scan for a given intent bias, with their priorities.
pub fn select_datasets(bias: Option<DatasetKind>) -> [(DatasetKind, f32); 3] {
    use DatasetKind::*;
    match bias {
        Some(Activity) => [(Activity, PRIMARY_PRIORITY), (DecisionItem, 1.2), (IndustrialZone, 0.8)],
        Some(IndustrialZone) => [(IndustrialZone, PRIMARY_PRIORITY), (Activity, 1.0), (DecisionItem, 0.5)],
        Some(DecisionItem) => [(DecisionItem, PRIMARY_PRIORITY), (Activity, 1.5), (IndustrialZone, 0.5)],
        None => [
            (Activity, NEUTRAL_PRIORITY),
            (IndustrialZone, NEUTRAL_PRIORITY),
            (DecisionItem, NEUTRAL_PRIORITY),
        ],
    }
}

pub struct Retriever {
    scoring: ScoringWeights,
    retrieval: RetrievalConfig,
}

impl Retriever {
    pub fn new(scoring: ScoringWeights, retrieval: RetrievalConfig) -> Self {
        Self { scoring, retrieval }
    }

    /// Score every record in the selected datasets and return the retained
    /// candidates, best first. `base_threshold` is the primary intent's
    /// retrieval threshold; conversational context relaxes it slightly.
    pub fn search(
        &self,
        analysis: &IntentAnalysis,
        context: &ConversationContext,
        bundle: &DatasetBundle,
        base_threshold: f32,
    ) -> Vec<ScoredCandidate> {
        let features = QueryFeatures::new(&analysis.normalized);
        if features.normalized.is_empty() {
            return Vec::new();
        }

        let threshold = self.effective_threshold(base_threshold, context);
        let mut candidates = Vec::new();

        for (kind, priority) in select_datasets(analysis.primary.bias) {
            for record in bundle.of_kind(kind) {
                let candidate = score_record(
                    record,
                    &features,
                    &analysis.entities,
                    context,
                    priority,
                    &self.scoring,
                );
                if candidate.score >= threshold {
                    candidates.push(candidate);
                }
            }
        }

        self.rank(&mut candidates);

        tracing::debug!(
            query = %analysis.normalized,
            retained = candidates.len(),
            threshold = threshold,
            top_score = candidates.first().map(|c| c.score).unwrap_or(0.0),
            "retrieval finished"
        );

        candidates
    }

    /// An established conversation earns a slightly more permissive
    /// threshold: the asker is drilling into a topic, not starting cold.
    fn effective_threshold(&self, base: f32, context: &ConversationContext) -> f32 {
        let mut threshold = base;
        if context.topics.len() > 2 {
            threshold *= self.retrieval.long_conversation_relief;
        }
        if !context.entities.is_empty() {
            threshold *= self.retrieval.context_entity_relief;
        }
        threshold
    }

    /// Rank retained candidates: total score first, then match ratio, then
    /// absolute matched-word count, then shorter primary text — the more
    /// specific record wins the final tie.
    fn rank(&self, candidates: &mut [ScoredCandidate]) {
        let score_eps = self.retrieval.rank_score_epsilon;
        let ratio_eps = self.retrieval.rank_ratio_epsilon;

        candidates.sort_by(|a, b| {
            use std::cmp::Ordering;

            if (a.score - b.score).abs() > score_eps {
                return b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal);
            }
            if (a.match_ratio - b.match_ratio).abs() > ratio_eps {
                return b
                    .match_ratio
                    .partial_cmp(&a.match_ratio)
                    .unwrap_or(Ordering::Equal);
            }
            match b.matched_words.len().cmp(&a.matched_words.len()) {
                Ordering::Equal => {
                    let a_len = a.record.primary_text.chars().count();
                    let b_len = b.record.primary_text.chars().count();
                    a_len.cmp(&b_len)
                }
                other => other,
            }
        });
    }
}
