// Parallel pair scoring: a bounded worker pool over a precomputed pair set.

pub mod processor;
pub mod record;
pub mod scorer;

pub use processor::{
    crossed_thresholds, percent_complete, CancellationToken, ChunkedProcessor, RunSummary,
};
pub use record::{CandidatePair, FeatureRecord, ScoredPair};
pub use scorer::PairScorer;
