// Pairwise scorers applied by the parallel pair scorer.

pub mod context;
pub mod edit;
pub mod reordering;
pub mod time;
pub mod traits;

pub use context::{jaccard_from_weights, ContextScorer};
pub use edit::{levenshtein, EditDistanceScorer};
pub use reordering::ReorderingScorer;
pub use time::TimeScorer;
pub use traits::Scorer;
