//! Intent Classification
//!
//! Scores the query against the catalog of intent definitions and returns
//! a ranked candidate list with confidences. Three additive signals, each
//! capped before summation: regex cues, keyword matches (strong keywords
//! count double, distinct matches only) and an entity-affinity bonus.
//! Negative keywords subtract. When nothing clears its threshold the
//! classifier falls back to follow-up inheritance, then to the general
//! intent.

pub mod catalog;
pub mod decompose;

use serde::{Deserialize, Serialize};

use crate::config::ClassifierWeights;
use crate::context::{self, ConversationTurn};
use crate::entities::{self, EntityBag};
use crate::normalize::normalize;
use crate::types::DatasetKind;

pub use catalog::{IntentCatalog, IntentDefinition, IntentName};

/// A classification result. Constructed fresh each turn; nothing here is
/// persisted beyond the trailing conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub name: IntentName,
    /// Clamped to `[0, 1]`.
    pub confidence: f32,
    pub matched_keywords: Vec<String>,
    /// Dataset this intent biases retrieval toward.
    pub bias: Option<DatasetKind>,
    /// True when carried forward from the previous turn instead of
    /// classified from the query itself.
    pub inherited: bool,
}

/// Grammatical shape of the question, from its leading interrogative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    What,
    Who,
    Where,
    When,
    How,
    Why,
    YesNo,
    Request,
    Statement,
}

/// Full classification output for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub primary: Intent,
    /// All candidates that cleared their thresholds, best first. Ties keep
    /// catalog order.
    pub ranked: Vec<Intent>,
    pub entities: EntityBag,
    pub is_follow_up: bool,
    pub query_type: QueryType,
    pub normalized: String,
}

pub struct IntentClassifier {
    catalog: IntentCatalog,
    weights: ClassifierWeights,
}

impl IntentClassifier {
    pub fn new(catalog: IntentCatalog, weights: ClassifierWeights) -> Self {
        Self { catalog, weights }
    }

    pub fn catalog(&self) -> &IntentCatalog {
        &self.catalog
    }

    /// Classify a query given the trailing conversation history.
    pub fn classify(&self, query: &str, history: &[ConversationTurn]) -> IntentAnalysis {
        let normalized = normalize(query);
        let entities = entities::extract(query);
        let is_follow_up = context::is_follow_up(query, history);

        let mut ranked: Vec<Intent> = self
            .catalog
            .definitions()
            .iter()
            .filter_map(|def| self.score_definition(def, &normalized, &entities))
            .collect();

        // Stable sort: equal confidences keep catalog declaration order.
        ranked.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if ranked.is_empty() && is_follow_up {
            if let Some(previous) = history.last() {
                ranked.push(Intent {
                    name: previous.intent.name,
                    confidence: self.weights.inherited_confidence,
                    matched_keywords: Vec::new(),
                    bias: previous.intent.bias,
                    inherited: true,
                });
            }
        }

        if ranked.is_empty() {
            ranked.push(Intent {
                name: IntentName::General,
                confidence: self.weights.general_confidence,
                matched_keywords: Vec::new(),
                bias: None,
                inherited: false,
            });
        }

        let primary = ranked[0].clone();
        tracing::debug!(
            query = %query,
            intent = %primary.name,
            confidence = primary.confidence,
            follow_up = is_follow_up,
            candidates = ranked.len(),
            "classified query"
        );

        IntentAnalysis {
            primary,
            ranked,
            entities,
            is_follow_up,
            query_type: classify_query_type(&normalized),
            normalized,
        }
    }

    fn score_definition(
        &self,
        def: &IntentDefinition,
        normalized: &str,
        entities: &EntityBag,
    ) -> Option<Intent> {
        if normalized.is_empty() {
            return None;
        }

        let w = &self.weights;
        let mut raw = 0.0f32;
        let mut matched_keywords = Vec::new();

        if def.cue_matches(normalized) {
            raw += w.cue_bonus;
        }

        let mut keyword_signal = 0.0f32;
        for keyword in &def.keywords {
            if normalized.contains(keyword.as_str()) {
                keyword_signal += w.keyword;
                matched_keywords.push(keyword.clone());
            }
        }
        for keyword in &def.strong_keywords {
            if normalized.contains(keyword.as_str()) {
                keyword_signal += w.strong_keyword;
                matched_keywords.push(keyword.clone());
            }
        }
        raw += keyword_signal.min(w.keyword_cap);

        if has_entity_affinity(def.bias, entities) {
            raw += w.entity_affinity;
        }

        for keyword in &def.negative_keywords {
            if normalized.contains(keyword.as_str()) {
                raw -= w.negative_penalty;
            }
        }

        let confidence = (raw.max(0.0) * def.weight).min(1.0);
        if confidence < def.threshold {
            return None;
        }

        Some(Intent {
            name: def.name,
            confidence,
            matched_keywords,
            bias: def.bias,
            inherited: false,
        })
    }
}

/// True when the query yielded an entity category the intent's target
/// dataset expects.
fn has_entity_affinity(bias: Option<DatasetKind>, entities: &EntityBag) -> bool {
    match bias {
        Some(DatasetKind::Activity) => !entities.activities.is_empty(),
        Some(DatasetKind::IndustrialZone) => {
            !entities.zones.is_empty() || !entities.governorates.is_empty()
        }
        Some(DatasetKind::DecisionItem) => {
            !entities.decision_numbers.is_empty() || !entities.sectors.is_empty()
        }
        None => false,
    }
}

/// Classify the grammatical shape of a normalized query.
pub fn classify_query_type(normalized: &str) -> QueryType {
    for (prefix, query_type) in [
        ("ما ", QueryType::What),
        ("ماذا ", QueryType::What),
        ("من ", QueryType::Who),
        ("اين ", QueryType::Where),
        ("متي ", QueryType::When),
        ("كيف ", QueryType::How),
        ("لماذا ", QueryType::Why),
        ("هل ", QueryType::YesNo),
    ] {
        if normalized.starts_with(prefix) {
            return query_type;
        }
    }

    if ["اريد", "ابحث عن", "احتاج"].iter().any(|p| normalized.contains(p)) {
        return QueryType::Request;
    }

    QueryType::Statement
}

/// Canned next-question predictions per intent family, for the answer
/// layer to offer as quick follow-ups.
pub fn suggest_follow_ups(name: IntentName) -> Vec<String> {
    use IntentName::*;

    let suggestions: &[&str] = match name {
        ActivityLicense => &[
            "ما هي الجهات المختصة؟",
            "ما هي القوانين المنظمة؟",
            "أين يمكن مزاولة النشاط؟",
        ],
        ActivityAuthority => &["ما هي التراخيص المطلوبة؟", "ما هو الدليل الإرشادي؟"],
        IndustrialZone | IndustrialZoneAuthority | IndustrialZoneDecision
        | IndustrialZoneArea | IndustrialZoneCheck => &[
            "ما هي الأنشطة الممكنة في هذه المنطقة؟",
            "كيف أحصل على مكان في المنطقة؟",
        ],
        DecisionIncentives | DecisionSector => {
            &["ما هي الحوافز المتاحة؟", "ما هي شروط الاستفادة؟"]
        }
        _ => &[],
    };

    suggestions.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::types::CandidateSummary;
    use chrono::Utc;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new(
            IntentCatalog::builtin().unwrap(),
            EngineConfig::default().classifier,
        )
    }

    fn license_turn() -> ConversationTurn {
        ConversationTurn {
            query: "ما هي تراخيص مصنع الملابس".into(),
            intent: Intent {
                name: IntentName::ActivityLicense,
                confidence: 0.7,
                matched_keywords: vec!["تراخيص".into()],
                bias: Some(DatasetKind::Activity),
                inherited: false,
            },
            entities: entities::extract("ما هي تراخيص مصنع الملابس"),
            top_candidates: vec![CandidateSummary {
                id: "activity_1".into(),
                primary_text: "تصنيع الملابس".into(),
                kind: DatasetKind::Activity,
                score: 0.8,
            }],
            asked_at: Utc::now(),
        }
    }

    #[test]
    fn license_query_classifies_above_threshold() {
        let analysis = classifier().classify("ما هي تراخيص مصنع الملابس", &[]);
        assert_eq!(analysis.primary.name, IntentName::ActivityLicense);
        let threshold = classifier()
            .catalog()
            .get(IntentName::ActivityLicense)
            .unwrap()
            .threshold;
        assert!(analysis.primary.confidence >= threshold);
        assert_eq!(analysis.query_type, QueryType::What);
    }

    #[test]
    fn authority_query_beats_description_via_negatives() {
        let analysis = classifier().classify("من الجهة المختصة بإصدار الترخيص؟", &[]);
        assert_eq!(analysis.primary.name, IntentName::ActivityAuthority);
    }

    #[test]
    fn decision_check_is_easy_to_trigger() {
        let analysis = classifier().classify("هل صناعة الأدوية في القرار 104؟", &[]);
        assert_eq!(analysis.primary.name, IntentName::DecisionIncentives);
    }

    #[test]
    fn unmatched_query_falls_back_to_general() {
        let analysis = classifier().classify("الطقس اليوم جميل والسماء صافية تماما", &[]);
        assert_eq!(analysis.primary.name, IntentName::General);
        assert_eq!(analysis.primary.confidence, 0.4);
        assert!(!analysis.primary.inherited);
    }

    #[test]
    fn follow_up_inherits_previous_intent() {
        let history = vec![license_turn()];
        let analysis = classifier().classify("والتكلفة؟", &history);
        assert!(analysis.is_follow_up);
        assert_eq!(analysis.primary.name, IntentName::ActivityLicense);
        assert!(analysis.primary.inherited);
        assert_eq!(analysis.primary.confidence, 0.55);
    }

    #[test]
    fn no_inheritance_without_history() {
        let analysis = classifier().classify("والتكلفة؟", &[]);
        assert_eq!(analysis.primary.name, IntentName::General);
    }

    #[test]
    fn empty_query_yields_general_intent() {
        let analysis = classifier().classify("", &[]);
        assert_eq!(analysis.primary.name, IntentName::General);
        assert!(analysis.entities.is_empty());
        assert!(analysis.ranked.len() == 1);
    }

    #[test]
    fn confidence_is_clamped_to_one() {
        // Pile up cue + strong keywords + affinity on a weighted intent.
        let analysis =
            classifier().classify("هل المناطق الصناعية منطقة صناعية بمحافظة الشرقية؟", &[]);
        for intent in &analysis.ranked {
            assert!(intent.confidence <= 1.0);
        }
    }

    #[test]
    fn query_type_detection() {
        assert_eq!(classify_query_type(&normalize("كيف أحصل على ترخيص")), QueryType::How);
        assert_eq!(classify_query_type(&normalize("هل النشاط معتمد")), QueryType::YesNo);
        assert_eq!(classify_query_type(&normalize("أين المنطقة")), QueryType::Where);
        assert_eq!(classify_query_type(&normalize("أريد فتح مصنع")), QueryType::Request);
        assert_eq!(classify_query_type(&normalize("النشاط معتمد")), QueryType::Statement);
    }

    #[test]
    fn follow_up_suggestions_cover_intent_families() {
        assert!(!suggest_follow_ups(IntentName::ActivityLicense).is_empty());
        assert!(!suggest_follow_ups(IntentName::IndustrialZone).is_empty());
        assert!(suggest_follow_ups(IntentName::General).is_empty());
    }
}
