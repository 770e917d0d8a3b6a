// ContextBag: the per-item multiset of neighbors seen inside the context window.
//
// Exactly one entry exists per neighbor stem. Counts only ever grow during
// collection, and a neighbor can only enter the bag if its stem is in the
// allowed-context vocabulary. Scores are assigned afterwards by a
// ContextWeighting; scoring again with a different weighting overwrites them.

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::weighting::ContextWeighting;
use crate::dictionary::SeedDictionary;
use crate::item::{ItemSet, Term, Vocabulary};
use crate::text::Normalizer;

/// One neighbor in a context bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub term: Term,
    /// Times the neighbor fell inside the owner's window
    pub count: u64,
    /// Weight assigned by the last scoring pass (0.0 until scored)
    pub score: f64,
}

impl ContextEntry {
    fn new(term: Term) -> Self {
        Self {
            term,
            count: 1,
            score: 0.0,
        }
    }
}

/// Neighbor stem -> entry map with scoring and pruning.
#[derive(Debug, Clone, Default)]
pub struct ContextBag {
    entries: HashMap<String, ContextEntry>,
    scored_by: Option<String>,
    projected: bool,
}

impl ContextBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// O(1) lookup by neighbor stem.
    pub fn get(&self, stem: &str) -> Option<&ContextEntry> {
        self.entries.get(stem)
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.entries.contains_key(stem)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ContextEntry> {
        self.entries.values()
    }

    /// Count of a neighbor, 0 if absent.
    pub fn count(&self, stem: &str) -> u64 {
        self.entries.get(stem).map_or(0, |e| e.count)
    }

    /// Normalize `token` and record it as a neighbor.
    ///
    /// Existing neighbors have their count incremented. New neighbors are
    /// inserted with count 1 only when their stem is in `vocabulary`;
    /// otherwise nothing happens and `None` is returned.
    pub fn add_context_word(
        &mut self,
        token: &str,
        normalizer: &Normalizer,
        vocabulary: &Vocabulary,
    ) -> Option<&Term> {
        let stem = normalizer.stem(token);
        self.add_context_term(token, &stem, vocabulary)
    }

    /// Same as `add_context_word` for a token whose stem is already known.
    pub fn add_context_term(
        &mut self,
        surface: &str,
        stem: &str,
        vocabulary: &Vocabulary,
    ) -> Option<&Term> {
        if self.entries.contains_key(stem) {
            let entry = self.entries.get_mut(stem)?;
            entry.count += 1;
            return Some(&entry.term);
        }
        if !vocabulary.contains(stem) {
            return None;
        }
        let entry = self
            .entries
            .entry(stem.to_string())
            .or_insert_with(|| ContextEntry::new(Term::new(surface, stem)));
        Some(&entry.term)
    }

    /// Apply `weighting` to every neighbor, overwriting any previous score.
    pub fn score_contextual_items(
        &mut self,
        owner: &Term,
        weighting: &dyn ContextWeighting,
    ) -> Result<()> {
        if let Some(previous) = &self.scored_by {
            debug!(
                item = owner.stem,
                previous = previous.as_str(),
                next = weighting.name(),
                "Re-scoring context bag"
            );
        }
        for entry in self.entries.values_mut() {
            entry.score = weighting.weigh(owner, entry)?;
        }
        self.scored_by = Some(weighting.name().to_string());
        Ok(())
    }

    pub fn is_scored(&self) -> bool {
        self.scored_by.is_some()
    }

    /// Name of the weighting that produced the current scores.
    pub fn scored_by(&self) -> Option<&str> {
        self.scored_by.as_deref()
    }

    /// Keep the first `keep` entries under `compare`, dropping the rest.
    /// Does nothing if the bag already has `keep` entries or fewer.
    pub fn prune_context<F>(&mut self, keep: usize, mut compare: F)
    where
        F: FnMut(&ContextEntry, &ContextEntry) -> Ordering,
    {
        if self.entries.len() <= keep {
            return;
        }
        let mut sorted: Vec<ContextEntry> = self.entries.drain().map(|(_, e)| e).collect();
        sorted.sort_by(|a, b| compare(a, b));
        sorted.truncate(keep);
        self.entries = sorted
            .into_iter()
            .map(|e| (e.term.stem.clone(), e))
            .collect();
    }

    /// Neighbor weights used for overlap scoring: the score once scored, the raw count before.
    pub fn weights(&self) -> HashMap<&str, f64> {
        let scored = self.is_scored();
        self.entries
            .iter()
            .map(|(stem, e)| {
                let w = if scored { e.score } else { e.count as f64 };
                (stem.as_str(), w)
            })
            .collect()
    }

    /// Largest weight in the bag (0.0 when empty).
    pub fn max_weight(&self) -> f64 {
        self.weights().values().copied().fold(0.0, f64::max)
    }

    /// Whether this bag has been mapped into the other language's vocabulary.
    pub fn is_projected(&self) -> bool {
        self.projected
    }

    /// Map every neighbor through `dictionary`.
    ///
    /// Each translation receives the neighbor's full count and score; several
    /// neighbors translating to the same stem accumulate. Neighbors without a
    /// translation are dropped.
    pub fn project(&self, dictionary: &SeedDictionary) -> ContextBag {
        let mut projected: HashMap<String, ContextEntry> = HashMap::new();
        for entry in self.entries.values() {
            for target in dictionary.translations(&entry.term.stem) {
                let slot = projected.entry(target.clone()).or_insert_with(|| ContextEntry {
                    term: Term::new(target.as_str(), target.as_str()),
                    count: 0,
                    score: 0.0,
                });
                slot.count += entry.count;
                slot.score += entry.score;
            }
        }
        ContextBag {
            entries: projected,
            scored_by: self.scored_by.clone(),
            projected: true,
        }
    }
}

/// Highest score first, ties broken by stem.
pub fn by_score_desc(a: &ContextEntry, b: &ContextEntry) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.term.stem.cmp(&b.term.stem))
}

/// Highest count first, ties broken by stem.
pub fn by_count_desc(a: &ContextEntry, b: &ContextEntry) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| a.term.stem.cmp(&b.term.stem))
}

/// Score every context bag in `items` with `weighting`.
pub fn score_item_set(items: &mut ItemSet, weighting: &dyn ContextWeighting) -> Result<()> {
    for item in items.iter_mut() {
        if let Some(bag) = item.context.as_mut() {
            bag.score_contextual_items(&item.term, weighting)?;
        }
    }
    Ok(())
}

/// Prune every context bag in `items` to `keep` entries.
pub fn prune_item_set<F>(items: &mut ItemSet, keep: usize, compare: F)
where
    F: Fn(&ContextEntry, &ContextEntry) -> Ordering,
{
    for item in items.iter_mut() {
        if let Some(bag) = item.context.as_mut() {
            bag.prune_context(keep, &compare);
        }
    }
}
