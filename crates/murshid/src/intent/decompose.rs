//! Query Decomposition
//!
//! Splits compound questions into independent sub-queries so each part can
//! be retrieved on its own. Handles Arabic coordinating conjunctions and
//! multiple question marks. Single-intent queries come back whole.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, significant_words};

static CONJUNCTION_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s(?:و|او|ثم|كذلك|ايضا|بالاضافه)\s").expect("conjunction regex is valid")
});

static QUESTION_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"؟\s*").expect("question split regex is valid"));

/// Minimum words before a query is considered for decomposition.
const MIN_QUERY_WORDS: usize = 5;

/// Minimum significant words for a fragment to stand as a sub-query.
const MIN_PART_WORDS: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecomposedQuery {
    pub original: String,
    /// Sub-queries in asking order. Holds just the original when the query
    /// is a single question.
    pub sub_queries: Vec<String>,
    pub strategy: DecompositionStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecompositionStrategy {
    Single,
    /// Split on a coordinating conjunction.
    Conjunction,
    /// Split on multiple question marks.
    MultiQuestion,
}

/// Decompose a compound query into sub-queries.
pub fn decompose_query(query: &str) -> DecomposedQuery {
    let normalized = normalize(query);

    if normalized.split_whitespace().count() < MIN_QUERY_WORDS {
        return single(&normalized);
    }

    // Multiple question marks are the strongest compound signal.
    if normalized.matches('؟').count() > 1 {
        let parts: Vec<String> = QUESTION_SPLIT_RE
            .split(&normalized)
            .map(str::trim)
            .filter(|p| significant_words(p).len() >= MIN_PART_WORDS)
            .map(|p| format!("{p}؟"))
            .collect();
        if parts.len() >= 2 {
            return DecomposedQuery {
                original: normalized,
                sub_queries: parts,
                strategy: DecompositionStrategy::MultiQuestion,
            };
        }
    }

    let parts: Vec<String> = CONJUNCTION_SPLIT_RE
        .split(&normalized)
        .map(str::trim)
        .filter(|p| significant_words(p).len() >= MIN_PART_WORDS)
        .map(str::to_string)
        .collect();
    if parts.len() >= 2 {
        return DecomposedQuery {
            original: normalized,
            sub_queries: parts,
            strategy: DecompositionStrategy::Conjunction,
        };
    }

    single(&normalized)
}

fn single(normalized: &str) -> DecomposedQuery {
    DecomposedQuery {
        original: normalized.to_string(),
        sub_queries: vec![normalized.to_string()],
        strategy: DecompositionStrategy::Single,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_query_is_never_decomposed() {
        let result = decompose_query("ما هي التراخيص؟");
        assert_eq!(result.strategy, DecompositionStrategy::Single);
        assert_eq!(result.sub_queries.len(), 1);
    }

    #[test]
    fn splits_on_multiple_question_marks() {
        let result =
            decompose_query("ما هي التراخيص المطلوبة؟ ما هي الجهة المختصة بالإصدار؟");
        assert_eq!(result.strategy, DecompositionStrategy::MultiQuestion);
        assert_eq!(result.sub_queries.len(), 2);
        assert!(result.sub_queries[0].contains("التراخيص"));
        assert!(result.sub_queries[1].contains("الجهه"));
    }

    #[test]
    fn splits_on_conjunction() {
        let result = decompose_query("التراخيص المطلوبة للمصنع ثم الجهة المختصة بالإصدار");
        assert_eq!(result.strategy, DecompositionStrategy::Conjunction);
        assert_eq!(result.sub_queries.len(), 2);
    }

    #[test]
    fn single_intent_query_comes_back_whole() {
        let result = decompose_query("ما هي التراخيص المطلوبة لمصنع الأغذية الجديد");
        assert_eq!(result.strategy, DecompositionStrategy::Single);
    }

    #[test]
    fn fragments_below_minimum_are_not_sub_queries() {
        // The second fragment has one significant word and cannot stand alone.
        let result = decompose_query("ما هي التراخيص المطلوبة للمصنع ثم الجهة");
        assert_eq!(result.strategy, DecompositionStrategy::Single);
    }
}
