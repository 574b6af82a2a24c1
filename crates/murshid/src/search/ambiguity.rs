//! Ambiguity Analysis
//!
//! Inspects the score distribution of the ranked candidates to decide
//! whether the top results are too close to pick one. Everything here
//! works on the confidence scale (score over the score ceiling), the same
//! scale the "clearly confident" threshold is defined on.

use serde::{Deserialize, Serialize};

use crate::config::AmbiguityConfig;
use crate::types::ScoredCandidate;

/// Outcome of ambiguity analysis over a ranked candidate list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmbiguityReport {
    /// True when more than one candidate sits within the close margin of
    /// the top AND the top itself is not clearly confident.
    pub has_ambiguity: bool,
    /// Indices into the ranked list of all candidates within the close
    /// margin of the top. Holds at least the top itself when candidates
    /// exist.
    pub close_group: Vec<usize>,
    /// Confidence of the best candidate, `0.0` when the list is empty.
    pub top_confidence: f32,
}

/// Where the caller should take the result next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseRoute {
    /// One dominant candidate: answer in detail.
    Detailed,
    /// Several viable candidates, none ambiguous: present a list.
    Options,
    /// Top candidates indistinguishable: ask the user to disambiguate.
    Clarification,
    /// Nothing retained. A valid outcome, not an error.
    NoResults,
}

pub struct AmbiguityAnalyzer {
    config: AmbiguityConfig,
    score_cap: f32,
}

impl AmbiguityAnalyzer {
    pub fn new(config: AmbiguityConfig, score_cap: f32) -> Self {
        Self { config, score_cap }
    }

    /// Analyze a ranked (best-first) candidate list.
    ///
    /// A single very strong match is never flagged ambiguous: once the top
    /// confidence reaches the clear threshold, nearby runners-up are noise
    /// relative to its certainty.
    pub fn analyze(&self, candidates: &[ScoredCandidate]) -> AmbiguityReport {
        let Some(top) = candidates.first() else {
            return AmbiguityReport::default();
        };

        let top_confidence = top.confidence(self.score_cap);
        let close_group: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| top_confidence - c.confidence(self.score_cap) < self.config.close_margin)
            .map(|(i, _)| i)
            .collect();

        let has_ambiguity =
            close_group.len() > 1 && top_confidence < self.config.clear_confidence;

        if has_ambiguity {
            tracing::debug!(
                group = close_group.len(),
                top_confidence = top_confidence,
                "close score group requires clarification"
            );
        }

        AmbiguityReport {
            has_ambiguity,
            close_group,
            top_confidence,
        }
    }

    /// Decide the downstream response shape for a ranked list and its
    /// ambiguity report.
    pub fn route(&self, report: &AmbiguityReport, candidates: &[ScoredCandidate]) -> ResponseRoute {
        if candidates.is_empty() {
            return ResponseRoute::NoResults;
        }
        if report.has_ambiguity {
            return ResponseRoute::Clarification;
        }
        if candidates.len() == 1 {
            return ResponseRoute::Detailed;
        }

        let runner_up = candidates[1].confidence(self.score_cap);
        if report.top_confidence - runner_up > self.config.dominance_gap {
            ResponseRoute::Detailed
        } else {
            ResponseRoute::Options
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::store::build_record;
    use crate::types::{DatasetKind, ScoreBreakdown};

    fn analyzer() -> AmbiguityAnalyzer {
        let config = EngineConfig::default();
        AmbiguityAnalyzer::new(config.ambiguity, config.scoring.score_cap)
    }

    fn candidate(id: &str, score: f32) -> ScoredCandidate {
        ScoredCandidate {
            record: build_record(DatasetKind::Activity, id, "تصنيع الملابس", None),
            score,
            breakdown: ScoreBreakdown::default(),
            matched_words: Vec::new(),
            matched_phrases: Vec::new(),
            match_ratio: 0.0,
        }
    }

    #[test]
    fn empty_list_is_not_ambiguous() {
        let report = analyzer().analyze(&[]);
        assert!(!report.has_ambiguity);
        assert!(report.close_group.is_empty());
        assert_eq!(report.top_confidence, 0.0);
    }

    #[test]
    fn close_weak_scores_are_ambiguous() {
        // Confidences 0.55 and 0.52 on a cap of 2.0.
        let candidates = vec![candidate("z1", 1.10), candidate("z2", 1.04)];
        let report = analyzer().analyze(&candidates);
        assert!(report.has_ambiguity);
        assert_eq!(report.close_group, vec![0, 1]);
    }

    #[test]
    fn dominant_top_is_never_ambiguous() {
        // Both above the clear-confidence threshold and within the margin
        // of each other.
        let candidates = vec![candidate("a", 1.40), candidate("b", 1.36)];
        let report = analyzer().analyze(&candidates);
        assert!(report.top_confidence >= 0.65);
        assert!(!report.has_ambiguity);
    }

    #[test]
    fn distant_runner_up_is_not_ambiguous() {
        let candidates = vec![candidate("a", 1.0), candidate("b", 0.3)];
        let report = analyzer().analyze(&candidates);
        assert!(!report.has_ambiguity);
        assert_eq!(report.close_group, vec![0]);
    }

    #[test]
    fn routes_follow_the_report() {
        let a = analyzer();

        assert_eq!(a.route(&a.analyze(&[]), &[]), ResponseRoute::NoResults);

        let single = vec![candidate("a", 0.8)];
        assert_eq!(a.route(&a.analyze(&single), &single), ResponseRoute::Detailed);

        let ambiguous = vec![candidate("a", 1.10), candidate("b", 1.04)];
        assert_eq!(
            a.route(&a.analyze(&ambiguous), &ambiguous),
            ResponseRoute::Clarification
        );

        let dominant = vec![candidate("a", 1.6), candidate("b", 0.4)];
        assert_eq!(
            a.route(&a.analyze(&dominant), &dominant),
            ResponseRoute::Detailed
        );

        let spread = vec![candidate("a", 1.44), candidate("b", 1.30)];
        assert_eq!(a.route(&a.analyze(&spread), &spread), ResponseRoute::Options);
    }
}
