//! Multi-signal ranked retrieval over the reference datasets.

pub mod ambiguity;
pub mod retriever;
pub mod scorer;

pub use ambiguity::{AmbiguityAnalyzer, AmbiguityReport, ResponseRoute};
pub use retriever::{select_datasets, Retriever};
pub use scorer::QueryFeatures;
