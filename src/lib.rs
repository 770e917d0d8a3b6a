// Lexmine: contextual and temporal similarity signals for bilingual lexicon induction
//
// This is the library root. Collectors attach signals to items (context bags,
// temporal histograms, reordering tables), scorers compare a source item with
// a target item, and the pair scorer applies every scorer to a large
// candidate pair set on a bounded worker pool.

pub mod config;
pub mod context;
pub mod dictionary;
pub mod error;
pub mod item;
pub mod pairs;
pub mod reorder;
pub mod scoring;
pub mod telemetry;
pub mod temporal;
pub mod text;

pub use error::{Error, HistogramError, Result};
