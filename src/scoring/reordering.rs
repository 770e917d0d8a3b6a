// Reordering similarity: do a phrase and its candidate translation sit the
// same way relative to neighbors that are themselves translations?
//
// For every neighbor f' of the source phrase and every dictionary translation
// e' of f' that is a neighbor of the target phrase, the two orientation
// distributions are compared as 1 - L1/2 (1.0 = identical, 0.0 = disjoint).
// The score is the mean over all matched neighbor pairs, 0.0 if none match.

use anyhow::Result;

use super::traits::Scorer;
use crate::dictionary::SeedDictionary;
use crate::item::Item;
use crate::reorder::{OrientationCounts, ReorderingTable};

pub struct ReorderingScorer {
    source: ReorderingTable,
    target: ReorderingTable,
    dictionary: SeedDictionary,
}

impl ReorderingScorer {
    pub fn new(source: ReorderingTable, target: ReorderingTable, dictionary: SeedDictionary) -> Self {
        Self {
            source,
            target,
            dictionary,
        }
    }
}

fn distribution_similarity(a: &OrientationCounts, b: &OrientationCounts) -> f64 {
    let l1: f64 = a
        .distribution()
        .iter()
        .zip(b.distribution().iter())
        .map(|(x, y)| (x - y).abs())
        .sum();
    1.0 - l1 / 2.0
}

impl Scorer for ReorderingScorer {
    fn name(&self) -> &str {
        "reordering"
    }

    fn score(&self, source: &Item, target: &Item) -> Result<f64> {
        let (Some(src_neighbors), Some(tgt_neighbors)) = (
            self.source.neighbors(source.stem()),
            self.target.neighbors(target.stem()),
        ) else {
            return Ok(0.0);
        };

        let mut total = 0.0;
        let mut matched = 0usize;
        for (neighbor, src_counts) in src_neighbors {
            for translation in self.dictionary.translations(neighbor) {
                if let Some(tgt_counts) = tgt_neighbors.get(translation) {
                    total += distribution_similarity(src_counts, tgt_counts);
                    matched += 1;
                }
            }
        }

        if matched == 0 {
            Ok(0.0)
        } else {
            Ok(total / matched as f64)
        }
    }
}
