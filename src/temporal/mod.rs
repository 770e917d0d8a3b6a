// Temporal fingerprints: per-item occurrence counts over discrete time bins.

pub mod collector;
pub mod corpus;
pub mod histogram;

pub use collector::{align_item_sets, alignment_removals, normalize_all, CollectedBins, TemporalHistogramCollector};
pub use corpus::{DayCorpus, MemoryDayCorpus};
pub use histogram::{cosine, TemporalHistogram};
