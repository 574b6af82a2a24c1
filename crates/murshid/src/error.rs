//! Error types for the query engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the query engine.
///
/// Extraction, classification and scoring are pure functions over validated
/// in-memory data and never fail for any well-formed string input; the
/// variants here cover the two genuinely fallible boundaries, catalog
/// loading and dataset retrieval. An empty ranked-candidate list is a valid
/// outcome, not an error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An intent definition failed validation at catalog-load time.
    #[error("Invalid intent definition '{intent}': {message}")]
    Catalog { intent: String, message: String },

    /// Engine configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The dataset provider failed. Distinct from an empty result set.
    #[error("Dataset source failed: {0}")]
    DataSource(String),
}
