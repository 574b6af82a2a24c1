//! Shared data model: datasets, records and scored candidates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three reference datasets the engine answers from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    /// Licensed business activities.
    Activity,
    /// Approved industrial zones.
    IndustrialZone,
    /// Items of the tax-incentive decision list.
    DecisionItem,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] = [
        DatasetKind::Activity,
        DatasetKind::IndustrialZone,
        DatasetKind::DecisionItem,
    ];

    /// Key used by the dataset store for this collection.
    pub fn store_key(&self) -> &'static str {
        match self {
            DatasetKind::Activity => "activities",
            DatasetKind::IndustrialZone => "industrial",
            DatasetKind::DecisionItem => "decision104",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.store_key())
    }
}

/// One indexed unit from a dataset. Immutable after load; the pipeline
/// only ever reads records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Unique, stable identifier from the dataset store.
    pub id: String,
    /// Canonical short label (normalized at load).
    pub primary_text: String,
    /// Longer structured text with labeled sections, where available.
    pub enriched_text: Option<String>,
    pub kind: DatasetKind,
    /// Normalized primary and enriched text joined, built once at load.
    /// The comparison surface for every scoring signal.
    pub search_text: String,
    /// Labeled sections of the enriched text, parsed once at load time.
    /// Keys are normalized section labels, values the section bodies.
    pub sections: Vec<(String, String)>,
    /// Kind-specific fields extracted at load time.
    pub details: RecordDetails,
}

impl Record {
    /// Look up a section body by its normalized label.
    pub fn section(&self, normalized_label: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|(label, _)| label == normalized_label)
            .map(|(_, body)| body.as_str())
    }
}

/// Fixed field set per dataset kind, replacing ad hoc optional fields on a
/// shared shape. Populated from the enriched sections at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RecordDetails {
    Activity {
        /// Link to the official activity guide, when the enriched text
        /// carries one.
        guide_url: Option<String>,
    },
    IndustrialZone {
        governorate: Option<String>,
        supervising_authority: Option<String>,
        area: Option<String>,
        establishment_decree: Option<String>,
    },
    DecisionItem {
        sector: Option<String>,
        category: Option<String>,
    },
}

/// Per-signal contributions to a candidate's total score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub exact: f32,
    pub words: f32,
    pub phrases: f32,
    pub entities: f32,
    pub context: f32,
    pub priority: f32,
}

/// A dataset record with its relevance score for the current query.
/// Ephemeral: produced per query, consumed by ranking and ambiguity
/// analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub record: Record,
    /// Total score, clamped to `[0, score_cap]`.
    pub score: f32,
    pub breakdown: ScoreBreakdown,
    pub matched_words: Vec<String>,
    pub matched_phrases: Vec<String>,
    /// Matched words over significant query words.
    pub match_ratio: f32,
}

impl ScoredCandidate {
    /// Score projected onto `[0, 1]`, the scale confidence thresholds are
    /// defined on.
    pub fn confidence(&self, score_cap: f32) -> f32 {
        if score_cap <= 0.0 {
            return 0.0;
        }
        (self.score / score_cap).clamp(0.0, 1.0)
    }
}

/// Compact record of a past candidate kept in conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: String,
    pub primary_text: String,
    pub kind: DatasetKind,
    pub score: f32,
}

impl From<&ScoredCandidate> for CandidateSummary {
    fn from(candidate: &ScoredCandidate) -> Self {
        Self {
            id: candidate.record.id.clone(),
            primary_text: candidate.record.primary_text.clone(),
            kind: candidate.record.kind,
            score: candidate.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_lookup_matches_normalized_label() {
        let record = Record {
            id: "activity_1".into(),
            primary_text: "تصنيع الملابس".into(),
            enriched_text: None,
            kind: DatasetKind::Activity,
            search_text: "تصنيع الملابس".into(),
            sections: vec![("التراخيص المطلوبه".into(), "سجل صناعي".into())],
            details: RecordDetails::Activity { guide_url: None },
        };
        assert_eq!(record.section("التراخيص المطلوبه"), Some("سجل صناعي"));
        assert_eq!(record.section("الجهه المختصه"), None);
    }

    #[test]
    fn confidence_is_clamped_to_unit_range() {
        let candidate = ScoredCandidate {
            record: Record {
                id: "x".into(),
                primary_text: String::new(),
                enriched_text: None,
                kind: DatasetKind::Activity,
                search_text: String::new(),
                sections: Vec::new(),
                details: RecordDetails::Activity { guide_url: None },
            },
            score: 3.5,
            breakdown: ScoreBreakdown::default(),
            matched_words: Vec::new(),
            matched_phrases: Vec::new(),
            match_ratio: 0.0,
        };
        assert_eq!(candidate.confidence(2.0), 1.0);
        assert_eq!(candidate.confidence(0.0), 0.0);
    }
}
