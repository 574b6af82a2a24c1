//! Query Engine
//!
//! The pipeline entry point. One call classifies the query, folds in the
//! session's conversational context, scores the datasets, analyzes the
//! result spread and hands back everything the answer layer needs. The
//! session is updated at the end of the turn, after the response is
//! computed.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::context::{self, ConversationTurn, Session};
use crate::error::EngineResult;
use crate::intent::decompose::{decompose_query, DecompositionStrategy};
use crate::intent::{suggest_follow_ups, Intent, IntentAnalysis, IntentCatalog, IntentClassifier};
use crate::search::{AmbiguityAnalyzer, AmbiguityReport, ResponseRoute, Retriever};
use crate::store::{DatasetProvider, DatasetStore};
use crate::types::ScoredCandidate;

/// Everything the answer-formatting layer needs for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub query: String,
    pub intent: IntentAnalysis,
    /// Retained candidates, best first, bounded by the configured maximum.
    pub candidates: Vec<ScoredCandidate>,
    pub ambiguity: AmbiguityReport,
    pub route: ResponseRoute,
    /// Confidence of the top candidate, `0.0` with no results.
    pub confidence: f32,
    /// Likely next questions for the answer layer to offer.
    pub suggestions: Vec<String>,
    /// Parts of a compound question, in asking order. Empty for a single
    /// question; the caller may re-submit each part on its own.
    pub sub_queries: Vec<String>,
}

pub struct QueryEngine {
    config: EngineConfig,
    classifier: IntentClassifier,
    retriever: Retriever,
    analyzer: AmbiguityAnalyzer,
    store: DatasetStore,
}

impl QueryEngine {
    /// Build an engine from explicit parts. Fails fast on invalid
    /// configuration — never during a query.
    pub fn new(
        config: EngineConfig,
        catalog: IntentCatalog,
        provider: Box<dyn DatasetProvider>,
    ) -> EngineResult<Self> {
        config.validate()?;

        let classifier = IntentClassifier::new(catalog, config.classifier.clone());
        let retriever = Retriever::new(config.scoring.clone(), config.retrieval.clone());
        let analyzer = AmbiguityAnalyzer::new(config.ambiguity.clone(), config.scoring.score_cap);

        Ok(Self {
            config,
            classifier,
            retriever,
            analyzer,
            store: DatasetStore::new(provider),
        })
    }

    /// Engine with the default configuration and built-in intent catalog.
    pub fn with_defaults(provider: Box<dyn DatasetProvider>) -> EngineResult<Self> {
        Self::new(EngineConfig::default(), IntentCatalog::builtin()?, provider)
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Process one query within a session.
    ///
    /// Runs to completion synchronously; the only error source is the
    /// dataset provider. An empty or whitespace query short-circuits into
    /// a well-defined empty outcome and leaves the session untouched.
    pub fn handle_query(&self, text: &str, session: &mut Session) -> EngineResult<QueryOutcome> {
        let analysis = self.classifier.classify(text, session.history());

        if analysis.normalized.is_empty() {
            return Ok(QueryOutcome {
                query: text.to_string(),
                intent: analysis,
                candidates: Vec::new(),
                ambiguity: AmbiguityReport::default(),
                route: ResponseRoute::NoResults,
                confidence: 0.0,
                suggestions: Vec::new(),
                sub_queries: Vec::new(),
            });
        }

        let bundle = self.store.bundle()?;
        let conversation = context::build_context(session.history());

        let threshold = self.retrieval_threshold(&analysis.primary);
        let ranked = self
            .retriever
            .search(&analysis, &conversation, &bundle, threshold);

        let mut candidates = ranked;
        candidates.truncate(self.config.retrieval.max_results);

        // Close-group indices refer to the candidate list handed back.
        let ambiguity = self.analyzer.analyze(&candidates);
        let route = self.analyzer.route(&ambiguity, &candidates);

        let turn = ConversationTurn {
            query: text.to_string(),
            intent: analysis.primary.clone(),
            entities: analysis.entities.clone(),
            top_candidates: candidates
                .iter()
                .take(self.config.retrieval.turn_candidates)
                .map(Into::into)
                .collect(),
            asked_at: Utc::now(),
        };

        let decomposition = decompose_query(text);
        let sub_queries = if decomposition.strategy == DecompositionStrategy::Single {
            Vec::new()
        } else {
            decomposition.sub_queries
        };

        let outcome = QueryOutcome {
            query: text.to_string(),
            confidence: ambiguity.top_confidence,
            suggestions: suggest_follow_ups(analysis.primary.name),
            sub_queries,
            intent: analysis,
            candidates,
            ambiguity,
            route,
        };

        tracing::info!(
            intent = %outcome.intent.primary.name,
            results = outcome.candidates.len(),
            confidence = outcome.confidence,
            route = ?outcome.route,
            "handled query"
        );

        // Memory is mutated only here, after the response is computed.
        session.memory.push(turn);

        Ok(outcome)
    }

    /// The retrieval threshold for the turn's primary intent. Retrieval is
    /// deliberately more permissive than classification.
    fn retrieval_threshold(&self, intent: &Intent) -> f32 {
        self.classifier
            .catalog()
            .get(intent.name)
            .map(|def| def.retrieval_threshold)
            .unwrap_or(self.config.retrieval.general_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentName;
    use crate::store::{build_record, DatasetBundle, InMemoryProvider};
    use crate::types::DatasetKind;

    fn sample_bundle() -> DatasetBundle {
        DatasetBundle {
            activities: vec![
                build_record(
                    DatasetKind::Activity,
                    "activity_1",
                    "تصنيع الملابس",
                    Some("التراخيص المطلوبة: سجل صناعي، رخصة تشغيل\nالجهة المختصة: الهيئة العامة للتنمية الصناعية"),
                ),
                build_record(
                    DatasetKind::Activity,
                    "activity_2",
                    "تصنيع الأغذية",
                    Some("التراخيص المطلوبة: سجل صناعي، شهادة صحية"),
                ),
            ],
            industrial_zones: vec![
                build_record(
                    DatasetKind::IndustrialZone,
                    "industrial_1",
                    "المنطقة الصناعية الأولى بالعاشر من رمضان",
                    Some("المحافظة: الشرقية"),
                ),
                build_record(
                    DatasetKind::IndustrialZone,
                    "industrial_2",
                    "المنطقة الصناعية الثانية بالعاشر من رمضان",
                    Some("المحافظة: الشرقية"),
                ),
            ],
            decision_items: vec![build_record(
                DatasetKind::DecisionItem,
                "DEC_1",
                "صناعة الأدوية",
                Some("القطاع: قطاع أ"),
            )],
        }
    }

    fn engine() -> QueryEngine {
        QueryEngine::with_defaults(Box::new(InMemoryProvider::new(sample_bundle()))).unwrap()
    }

    struct FailingProvider;

    impl DatasetProvider for FailingProvider {
        fn fetch(&self) -> EngineResult<DatasetBundle> {
            Err(crate::error::EngineError::DataSource("cache gone".into()))
        }
    }

    #[test]
    fn license_query_returns_the_clothing_record_unambiguously() -> anyhow::Result<()> {
        let engine = engine();
        let mut session = Session::new();

        let outcome = engine.handle_query("ما هي تراخيص مصنع الملابس", &mut session)?;

        assert_eq!(outcome.intent.primary.name, IntentName::ActivityLicense);
        assert_eq!(outcome.candidates[0].record.id, "activity_1");
        assert!(!outcome.ambiguity.has_ambiguity);
        assert_eq!(session.history().len(), 1);
        Ok(())
    }

    #[test]
    fn near_identical_zones_are_flagged_ambiguous() {
        let engine = engine();
        let mut session = Session::new();

        let outcome = engine
            .handle_query("المنطقة الصناعية بالعاشر من رمضان", &mut session)
            .unwrap();

        assert!(outcome.ambiguity.has_ambiguity);
        assert_eq!(outcome.route, ResponseRoute::Clarification);
        assert!(outcome.ambiguity.close_group.len() >= 2);
        let ids: Vec<&str> = outcome
            .candidates
            .iter()
            .map(|c| c.record.id.as_str())
            .collect();
        assert!(ids.contains(&"industrial_1"));
        assert!(ids.contains(&"industrial_2"));
    }

    #[test]
    fn follow_up_inherits_context_entities_into_scoring() -> anyhow::Result<()> {
        let engine = engine();
        let mut session = Session::new();

        engine.handle_query("ما هي تراخيص مصنع الملابس", &mut session)?;
        let outcome = engine.handle_query("وماذا عن الجهة المختصة؟", &mut session)?;

        assert!(outcome.intent.is_follow_up);
        assert_eq!(outcome.candidates[0].record.id, "activity_1");
        // The prior turn's activity entity reached the scorer via context.
        assert!(outcome.candidates[0].breakdown.context > 0.0);
        Ok(())
    }

    #[test]
    fn history_is_bounded_after_many_turns() {
        let engine = engine();
        let mut session = Session::new();

        for i in 0..8 {
            engine
                .handle_query(&format!("ما هي تراخيص مصنع الملابس رقم {i}"), &mut session)
                .unwrap();
        }
        assert_eq!(session.history().len(), 5);
        assert!(session.history()[0].query.contains("رقم 3"));
        assert!(session.history()[4].query.contains("رقم 7"));
    }

    #[test]
    fn no_match_is_a_valid_empty_outcome() {
        let engine = engine();
        let mut session = Session::new();

        let outcome = engine
            .handle_query("الطقس اليوم جميل جدا في الخارج", &mut session)
            .unwrap();

        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.route, ResponseRoute::NoResults);
        assert_eq!(outcome.confidence, 0.0);
    }

    #[test]
    fn empty_query_short_circuits_without_touching_the_session() {
        let engine = engine();
        let mut session = Session::new();

        let outcome = engine.handle_query("   ", &mut session).unwrap();

        assert_eq!(outcome.intent.primary.name, IntentName::General);
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.route, ResponseRoute::NoResults);
        assert!(session.history().is_empty());
    }

    #[test]
    fn provider_failure_surfaces_as_error_not_empty_result() {
        let engine = QueryEngine::with_defaults(Box::new(FailingProvider)).unwrap();
        let mut session = Session::new();

        let result = engine.handle_query("ما هي تراخيص مصنع الملابس", &mut session);
        assert!(result.is_err());
    }

    #[test]
    fn clearing_the_session_resets_history() {
        let engine = engine();
        let mut session = Session::new();

        engine
            .handle_query("ما هي تراخيص مصنع الملابس", &mut session)
            .unwrap();
        session.clear();
        assert!(session.history().is_empty());
    }

    #[test]
    fn decision_query_prioritizes_the_decision_dataset() {
        let engine = engine();
        let mut session = Session::new();

        let outcome = engine
            .handle_query("هل صناعة الأدوية في القرار 104؟", &mut session)
            .unwrap();

        assert_eq!(outcome.intent.primary.name, IntentName::DecisionIncentives);
        assert_eq!(outcome.candidates[0].record.id, "DEC_1");
        assert!(!outcome.suggestions.is_empty());
    }

    #[test]
    fn compound_question_reports_its_parts() {
        let engine = engine();
        let mut session = Session::new();

        let outcome = engine
            .handle_query(
                "ما هي التراخيص المطلوبة لمصنع الملابس؟ ما هي الجهة المختصة بالإصدار؟",
                &mut session,
            )
            .unwrap();

        assert_eq!(outcome.sub_queries.len(), 2);

        let single = engine
            .handle_query("ما هي تراخيص مصنع الملابس", &mut session)
            .unwrap();
        assert!(single.sub_queries.is_empty());
    }
}
