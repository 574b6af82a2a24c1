//! Conversational Context
//!
//! Bounded per-session history plus the derived context object the
//! retriever consumes: merged entities, recency-weighted topic sequence
//! and the dominant dataset of recent turns. The session is an explicit
//! object owned by the caller — there is no process-wide conversation
//! state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::EntityBag;
use crate::intent::Intent;
use crate::intent::catalog::IntentName;
use crate::normalize::{content_word_count, normalize};
use crate::types::{CandidateSummary, DatasetKind};

/// Turns retained per session; the oldest is evicted beyond this.
pub const MAX_TURNS: usize = 5;

/// Demonstrative / referential cues, in normalized spelling.
const REFERENCE_CUES: [&str; 7] = ["هذا", "هذه", "ذلك", "تلك", "نفس", "السابق", "المذكور"];

/// Continuity cues that chain a query onto the previous topic.
const CONTINUITY_CUES: [&str; 6] = ["وماذا عن", "ماذا عن", "ايضا", "كذلك", "كمان", "بالاضافه"];

/// Content words at or below which a query is assumed context-dependent.
const SHORT_QUERY_WORDS: usize = 3;

/// One completed exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub query: String,
    pub intent: Intent,
    pub entities: EntityBag,
    /// Bounded slice of the turn's top-ranked candidates.
    pub top_candidates: Vec<CandidateSummary>,
    pub asked_at: DateTime<Utc>,
}

/// Ordered, size-bounded turn history with FIFO eviction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
}

impl ConversationMemory {
    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        while self.turns.len() > MAX_TURNS {
            self.turns.remove(0);
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// A conversation session. Lifetime is owned by the caller; dropping or
/// clearing it is the only way history is reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub memory: ConversationMemory,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            memory: ConversationMemory::default(),
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        self.memory.turns()
    }

    pub fn clear(&mut self) {
        self.memory.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// A topic from recent history, weighted toward recency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedTopic {
    pub name: IntentName,
    pub weight: f32,
}

/// Context folded out of the trailing turns, consumed by the retriever.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Entities merged across recent turns, deduplicated.
    pub entities: EntityBag,
    /// Topic sequence with more recent turns weighted higher.
    pub topics: Vec<WeightedTopic>,
    /// The dataset most referenced by recent results.
    pub dominant_source: Option<DatasetKind>,
    pub last_intent: Option<Intent>,
}

/// Follow-up detection: a disjunction of three heuristics over the
/// normalized query. Always false on an empty history — there is nothing
/// to follow up on.
pub fn is_follow_up(query: &str, history: &[ConversationTurn]) -> bool {
    if history.is_empty() {
        return false;
    }

    let normalized = normalize(query);
    if normalized.is_empty() {
        return false;
    }

    if REFERENCE_CUES.iter().any(|cue| normalized.contains(cue)) {
        return true;
    }
    if CONTINUITY_CUES.iter().any(|cue| normalized.contains(cue)) {
        return true;
    }

    content_word_count(&normalized) <= SHORT_QUERY_WORDS
}

/// Fold the last turns into a [`ConversationContext`].
pub fn build_context(history: &[ConversationTurn]) -> ConversationContext {
    let recent: &[ConversationTurn] = if history.len() > MAX_TURNS {
        &history[history.len() - MAX_TURNS..]
    } else {
        history
    };

    let mut context = ConversationContext::default();
    if recent.is_empty() {
        return context;
    }

    let mut source_counts: Vec<(DatasetKind, usize)> =
        DatasetKind::ALL.iter().map(|k| (*k, 0)).collect();

    for (idx, turn) in recent.iter().enumerate() {
        let weight = (idx + 1) as f32 / recent.len() as f32;

        context.entities.merge(&turn.entities);

        // Keep one entry per topic at its highest (most recent) weight.
        match context.topics.iter_mut().find(|t| t.name == turn.intent.name) {
            Some(topic) => topic.weight = topic.weight.max(weight),
            None => context.topics.push(WeightedTopic {
                name: turn.intent.name,
                weight,
            }),
        }

        for candidate in &turn.top_candidates {
            if let Some(entry) = source_counts.iter_mut().find(|(k, _)| *k == candidate.kind) {
                entry.1 += 1;
            }
        }
    }

    context.dominant_source = source_counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(kind, _)| *kind);

    context.last_intent = recent.last().map(|turn| turn.intent.clone());

    context
}
