// Context overlap scoring: weighted Jaccard over two context bags.
//
// Each bag's weights are first divided by that bag's largest weight, so a
// frequent item and a rare item with the same neighborhood shape still score
// high. A bag's weights are its raw neighbor counts until a weighting has
// scored it, and the scores after. An unscored bag is therefore divided by its
// highest co-occurrence count; a scored bag by its highest score, which under
// TF-IDF need not belong to the most frequent neighbor. For every neighbor in either bag we take the minimum and maximum of
// the two normalized weights:
//
//   sum(min(a, b)) / sum(max(a, b))
//
// This gives 0.0 for disjoint neighborhoods and 1.0 for proportional ones.
// Source and target bags live in different vocabularies, so the source bag is
// projected through the seed dictionary in `prepare` before any comparison.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use anyhow::Result;

use super::traits::Scorer;
use crate::context::ContextBag;
use crate::dictionary::SeedDictionary;
use crate::item::{Item, Side};

/// Compute weighted Jaccard from raw weight maps.
///
/// Returns 0.0 when both maps are empty or all weights are zero. Keys are
/// visited in sorted order so the floating-point sum is reproducible.
pub fn jaccard_from_weights<K>(weights_a: &HashMap<K, f64>, weights_b: &HashMap<K, f64>) -> f64
where
    K: Eq + Hash + Ord,
{
    // Union of all keys from both sides
    let all_keys: BTreeSet<&K> = weights_a.keys().chain(weights_b.keys()).collect();

    if all_keys.is_empty() {
        return 0.0;
    }

    let mut min_sum = 0.0;
    let mut max_sum = 0.0;

    for key in all_keys {
        let a = weights_a.get(key).copied().unwrap_or(0.0);
        let b = weights_b.get(key).copied().unwrap_or(0.0);
        min_sum += a.min(b);
        max_sum += a.max(b);
    }

    if max_sum == 0.0 {
        0.0
    } else {
        min_sum / max_sum
    }
}

/// Bag weights divided by the bag's maximum weight: max count when unscored, max score when scored.
fn relative_weights(bag: &ContextBag) -> HashMap<&str, f64> {
    let mut weights = bag.weights();
    let max = weights.values().copied().fold(0.0, f64::max);
    if max > 0.0 {
        for w in weights.values_mut() {
            *w /= max;
        }
    }
    weights
}

/// Weighted overlap of two items' context bags.
pub struct ContextScorer {
    dictionary: Option<SeedDictionary>,
}

impl ContextScorer {
    /// Cross-language scorer: source bags are projected through `dictionary`.
    pub fn new(dictionary: SeedDictionary) -> Self {
        Self {
            dictionary: Some(dictionary),
        }
    }

    /// Both sides already share a vocabulary; no projection happens.
    pub fn monolingual() -> Self {
        Self { dictionary: None }
    }
}

impl Scorer for ContextScorer {
    fn name(&self) -> &str {
        "context"
    }

    fn prepare(&self, item: &mut Item) -> Result<()> {
        let Some(dictionary) = &self.dictionary else {
            return Ok(());
        };
        if item.side != Side::Source {
            return Ok(());
        }
        if let Some(bag) = item.context.as_mut() {
            if !bag.is_projected() {
                *bag = bag.project(dictionary);
            }
        }
        Ok(())
    }

    fn score(&self, source: &Item, target: &Item) -> Result<f64> {
        let (Some(bag_a), Some(bag_b)) = (source.context.as_ref(), target.context.as_ref()) else {
            anyhow::bail!(
                "Missing context bag for pair ({:?}, {:?})",
                source.stem(),
                target.stem()
            );
        };
        if self.dictionary.is_some() && !bag_a.is_projected() {
            anyhow::bail!(
                "Context bag of {:?} was not projected; call prepare() first",
                source.stem()
            );
        }
        Ok(jaccard_from_weights(
            &relative_weights(bag_a),
            &relative_weights(bag_b),
        ))
    }
}
