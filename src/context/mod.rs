// Contextual fingerprints: windowed neighbor counts and their weighting.

pub mod bag;
pub mod collector;
pub mod weighting;

pub use bag::{by_count_desc, by_score_desc, ContextBag, ContextEntry};
pub use collector::{CollectionStats, ContextCollector};
pub use weighting::{ContextWeighting, RawCount, TfIdf};
