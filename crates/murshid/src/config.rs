//! Engine configuration: one explicit weight table for every scoring and
//! threshold constant, so catalog tuning never requires touching the
//! algorithm.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub classifier: ClassifierWeights,
    pub scoring: ScoringWeights,
    pub retrieval: RetrievalConfig,
    pub ambiguity: AmbiguityConfig,
}

/// Weights for the additive intent-confidence signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierWeights {
    /// Bonus when any of a definition's regex cues matches. Applied once.
    pub cue_bonus: f32,
    /// Contribution per distinct ordinary keyword match.
    pub keyword: f32,
    /// Contribution per distinct strong keyword match.
    pub strong_keyword: f32,
    /// Cap on the summed keyword signal.
    pub keyword_cap: f32,
    /// Flat bonus when the query carries an entity category the intent's
    /// target dataset expects.
    pub entity_affinity: f32,
    /// Penalty per negative keyword found in the query.
    pub negative_penalty: f32,
    /// Confidence assigned to an intent inherited from the previous turn.
    pub inherited_confidence: f32,
    /// Confidence of the default fallback intent.
    pub general_confidence: f32,
}

/// Weights for the per-record relevance signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Multiplier on the exact/substring signal.
    pub exact_match_multiplier: f32,
    /// Base value when query and primary text are equal.
    pub exact_equal: f32,
    /// Base value when one contains the other.
    pub exact_contains: f32,
    /// Per significant query word found in the combined text.
    pub word_match: f32,
    /// Extra when the word appears in the primary text itself.
    pub word_in_primary_extra: f32,
    /// Cap on the summed word signal.
    pub word_cap: f32,
    /// Per 2-/3-word query window found in the combined text.
    pub phrase_match: f32,
    /// Cap on the summed phrase signal.
    pub phrase_cap: f32,
    /// Per query entity found in the combined text.
    pub entity_bonus: f32,
    /// Per context-carried entity found. Deliberately smaller than
    /// `entity_bonus` so context cannot dominate a fresh query.
    pub context_bonus: f32,
    /// Score added per unit of dataset priority above 1.0.
    pub priority_step: f32,
    /// Ceiling on a candidate's total score.
    pub score_cap: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Ranked candidates returned to the caller.
    pub max_results: usize,
    /// Top candidates recorded into the conversation turn.
    pub turn_candidates: usize,
    /// Retention threshold when no intent targets a dataset.
    pub general_threshold: f32,
    /// Score difference below which two candidates are ranked by secondary
    /// criteria instead.
    pub rank_score_epsilon: f32,
    /// Match-ratio difference below which ranking falls through to the
    /// next criterion.
    pub rank_ratio_epsilon: f32,
    /// Threshold multiplier once a conversation spans more than two topics.
    pub long_conversation_relief: f32,
    /// Threshold multiplier when context carries entities.
    pub context_entity_relief: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbiguityConfig {
    /// Confidence margin within which candidates count as close to the top.
    pub close_margin: f32,
    /// Top confidence at or above which a result is never ambiguous.
    pub clear_confidence: f32,
    /// Confidence gap over the runner-up that routes straight to a
    /// detailed answer.
    pub dominance_gap: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierWeights {
                cue_bonus: 0.5,
                keyword: 0.25,
                strong_keyword: 0.5,
                keyword_cap: 0.75,
                entity_affinity: 0.2,
                negative_penalty: 0.15,
                inherited_confidence: 0.55,
                general_confidence: 0.4,
            },
            scoring: ScoringWeights {
                exact_match_multiplier: 1.8,
                exact_equal: 1.0,
                exact_contains: 0.8,
                word_match: 0.12,
                word_in_primary_extra: 0.03,
                word_cap: 0.45,
                phrase_match: 0.25,
                phrase_cap: 0.35,
                entity_bonus: 0.2,
                context_bonus: 0.06,
                priority_step: 0.1,
                score_cap: 2.0,
            },
            retrieval: RetrievalConfig {
                max_results: 5,
                turn_candidates: 3,
                general_threshold: 0.12,
                rank_score_epsilon: 0.05,
                rank_ratio_epsilon: 0.1,
                long_conversation_relief: 0.9,
                context_entity_relief: 0.95,
            },
            ambiguity: AmbiguityConfig {
                close_margin: 0.08,
                clear_confidence: 0.65,
                dominance_gap: 0.1,
            },
        }
    }
}

impl EngineConfig {
    /// Validate config values, rejecting clearly broken configurations
    /// before any query is processed.
    pub fn validate(&self) -> EngineResult<()> {
        if self.scoring.score_cap <= 0.0 {
            return Err(EngineError::Config("scoring.score_cap must be > 0".into()));
        }
        if self.scoring.exact_match_multiplier <= 0.0 {
            return Err(EngineError::Config(
                "scoring.exact_match_multiplier must be > 0".into(),
            ));
        }
        if self.retrieval.max_results == 0 {
            return Err(EngineError::Config("retrieval.max_results must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.retrieval.general_threshold) {
            return Err(EngineError::Config(
                "retrieval.general_threshold must be in [0.0, 1.0]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.ambiguity.close_margin) {
            return Err(EngineError::Config(
                "ambiguity.close_margin must be in [0.0, 1.0]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.ambiguity.clear_confidence) {
            return Err(EngineError::Config(
                "ambiguity.clear_confidence must be in [0.0, 1.0]".into(),
            ));
        }
        if self.retrieval.turn_candidates == 0 {
            return Err(EngineError::Config(
                "retrieval.turn_candidates must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Load a config from JSON, validating before use.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_score_cap_is_rejected() {
        let mut config = EngineConfig::default();
        config.scoring.score_cap = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_margin_is_rejected() {
        let mut config = EngineConfig::default();
        config.ambiguity.close_margin = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_roundtrip_preserves_weights() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = EngineConfig::from_json(&json).unwrap();
        assert_eq!(parsed.scoring.score_cap, config.scoring.score_cap);
        assert_eq!(parsed.retrieval.max_results, config.retrieval.max_results);
    }
}
