// Scorer trait: the abstraction behind every pair feature.
//
// A scorer is a pure function of two items. Scorers are shared read-only
// across worker threads, so anything they need beyond the items themselves
// (dictionaries, transliteration tables, reordering tables) is owned by the
// scorer and never mutated while scoring.

use anyhow::Result;

use crate::item::Item;

/// Similarity or distance between a source item and a target item.
pub trait Scorer: Send + Sync {
    /// Feature name written into each pair's record.
    fn name(&self) -> &str;

    /// True for distances, where lower scores mean better candidates.
    fn smaller_is_better(&self) -> bool {
        false
    }

    /// Adjust an item before any pair is scored (e.g. project its context bag).
    /// Runs single-threaded, once per item.
    fn prepare(&self, _item: &mut Item) -> Result<()> {
        Ok(())
    }

    fn score(&self, source: &Item, target: &Item) -> Result<f64>;
}
