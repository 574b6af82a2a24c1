//! Relevance Scoring
//!
//! Named, independently-testable signal functions combined through the
//! weight table in [`ScoringWeights`]. Each signal is capped on its own
//! before the total is clamped to the score ceiling, so no single signal
//! can run away with the ranking.

use crate::config::ScoringWeights;
use crate::context::ConversationContext;
use crate::entities::EntityBag;
use crate::normalize::{phrases, significant_words};
use crate::types::{Record, ScoreBreakdown, ScoredCandidate};

/// Query text pre-chopped into the shapes the signals consume. Built once
/// per query, shared across every record.
#[derive(Debug, Clone)]
pub struct QueryFeatures {
    pub normalized: String,
    pub words: Vec<String>,
    pub phrases: Vec<String>,
}

impl QueryFeatures {
    pub fn new(normalized: &str) -> Self {
        Self {
            normalized: normalized.to_string(),
            words: significant_words(normalized),
            phrases: phrases(normalized),
        }
    }
}

/// Full normalized query against the record's primary text. Equality beats
/// containment; both are boosted by the exact-match multiplier because a
/// title-level hit is worth more than any accumulation of word matches.
pub fn exact_signal(primary: &str, query: &str, w: &ScoringWeights) -> f32 {
    if primary.is_empty() || query.is_empty() {
        return 0.0;
    }
    if primary == query {
        w.exact_equal * w.exact_match_multiplier
    } else if primary.contains(query) || query.contains(primary) {
        w.exact_contains * w.exact_match_multiplier
    } else {
        0.0
    }
}

/// Per significant query word found in the combined text, with extra
/// weight when the word sits in the primary text itself. Returns the
/// capped signal and the matched words.
pub fn word_signal(
    words: &[String],
    primary: &str,
    combined: &str,
    w: &ScoringWeights,
) -> (f32, Vec<String>) {
    let mut signal = 0.0f32;
    let mut matched = Vec::new();

    for word in words {
        if combined.contains(word.as_str()) {
            signal += w.word_match;
            if primary.contains(word.as_str()) {
                signal += w.word_in_primary_extra;
            }
            matched.push(word.clone());
        }
    }

    (signal.min(w.word_cap), matched)
}

/// Contiguous 2-/3-word query windows found in the combined text.
pub fn phrase_signal(
    query_phrases: &[String],
    combined: &str,
    w: &ScoringWeights,
) -> (f32, Vec<String>) {
    let mut signal = 0.0f32;
    let mut matched = Vec::new();

    for phrase in query_phrases {
        if combined.contains(phrase.as_str()) {
            signal += w.phrase_match;
            matched.push(phrase.clone());
        }
    }

    (signal.min(w.phrase_cap), matched)
}

/// Recognized query entities found in the record's text.
pub fn entity_signal(entities: &EntityBag, combined: &str, w: &ScoringWeights) -> f32 {
    entities
        .iter_all()
        .filter(|entity| combined.contains(*entity))
        .count() as f32
        * w.entity_bonus
}

/// Entities carried over from conversation context. A smaller bonus than
/// direct entity matches so stale context cannot drown a fresh query.
pub fn context_signal(context: &ConversationContext, combined: &str, w: &ScoringWeights) -> f32 {
    context
        .entities
        .iter_all()
        .filter(|entity| combined.contains(*entity))
        .count() as f32
        * w.context_bonus
}

/// Contribution of the dataset's selection priority for this turn.
pub fn priority_signal(priority: f32, w: &ScoringWeights) -> f32 {
    (priority - 1.0) * w.priority_step
}

/// Score one record against the query. The total is clamped to
/// `[0, score_cap]` before it is ever compared to anything.
pub fn score_record(
    record: &Record,
    features: &QueryFeatures,
    entities: &EntityBag,
    context: &ConversationContext,
    priority: f32,
    w: &ScoringWeights,
) -> ScoredCandidate {
    let primary = record.primary_text.as_str();
    let combined = record.search_text.as_str();

    let exact = exact_signal(primary, &features.normalized, w);
    let (words, matched_words) = word_signal(&features.words, primary, combined, w);
    let (phrase, matched_phrases) = phrase_signal(&features.phrases, combined, w);
    let entity = entity_signal(entities, combined, w);
    let context_bonus = context_signal(context, combined, w);
    let priority_bonus = priority_signal(priority, w);

    let breakdown = ScoreBreakdown {
        exact,
        words,
        phrases: phrase,
        entities: entity,
        context: context_bonus,
        priority: priority_bonus,
    };

    let total = exact + words + phrase + entity + context_bonus + priority_bonus;
    let match_ratio = if features.words.is_empty() {
        0.0
    } else {
        matched_words.len() as f32 / features.words.len() as f32
    };

    ScoredCandidate {
        record: record.clone(),
        score: total.clamp(0.0, w.score_cap),
        breakdown,
        matched_words,
        matched_phrases,
        match_ratio,
    }
}
