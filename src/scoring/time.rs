// Temporal similarity: cosine between two items' normalized histograms.

use std::collections::BTreeSet;

use anyhow::{Context, Result};

use super::traits::Scorer;
use crate::item::Item;
use crate::temporal::cosine;

/// Cosine similarity of temporal histograms, optionally over a subset of bins.
#[derive(Debug, Clone, Default)]
pub struct TimeScorer {
    bins: Option<BTreeSet<usize>>,
}

impl TimeScorer {
    /// Compare over every bin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare only over the given bin indices.
    pub fn restricted_to<I>(bins: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        Self {
            bins: Some(bins.into_iter().collect()),
        }
    }
}

impl Scorer for TimeScorer {
    fn name(&self) -> &str {
        "time"
    }

    fn score(&self, source: &Item, target: &Item) -> Result<f64> {
        let (Some(a), Some(b)) = (source.temporal.as_ref(), target.temporal.as_ref()) else {
            anyhow::bail!(
                "Missing temporal histogram for pair ({:?}, {:?})",
                source.stem(),
                target.stem()
            );
        };
        cosine(a, b, self.bins.as_ref()).with_context(|| {
            format!(
                "Cannot compare histograms of {:?} and {:?}",
                source.stem(),
                target.stem()
            )
        })
    }
}
