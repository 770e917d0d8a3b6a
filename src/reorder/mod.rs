// Reordering signal: how in-vocabulary phrases are positioned relative to each other.
//
// Within a sentence, every pair of non-overlapping phrase occurrences is
// classified from the point of view of the first phrase: the neighbor sits
// immediately before it, immediately after it, or elsewhere within K tokens.
// Distances are counted in token positions, never in characters.

pub mod collector;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::text::{Normalizer, Tokenizer};

pub use collector::ReorderingCollector;

/// Position of a neighbor phrase relative to an anchor phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Neighbor ends exactly where the anchor starts
    Before,
    /// Neighbor starts exactly where the anchor ends
    After,
    /// Neighbor is separated from the anchor by 1..=K tokens
    Discontinuous,
}

/// One counter per orientation for an (anchor, neighbor) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientationCounts {
    pub before: u64,
    pub after: u64,
    pub discontinuous: u64,
}

impl OrientationCounts {
    pub fn record(&mut self, orientation: Orientation) {
        match orientation {
            Orientation::Before => self.before += 1,
            Orientation::After => self.after += 1,
            Orientation::Discontinuous => self.discontinuous += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.before + self.after + self.discontinuous
    }

    /// Relative frequencies `[before, after, discontinuous]`; all zero when empty.
    pub fn distribution(&self) -> [f64; 3] {
        let total = self.total();
        if total == 0 {
            return [0.0; 3];
        }
        let t = total as f64;
        [
            self.before as f64 / t,
            self.after as f64 / t,
            self.discontinuous as f64 / t,
        ]
    }
}

/// Anchor phrase -> neighbor phrase -> orientation counts.
#[derive(Debug, Clone, Default)]
pub struct ReorderingTable {
    relations: HashMap<String, HashMap<String, OrientationCounts>>,
}

impl ReorderingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, anchor: &str, neighbor: &str, orientation: Orientation) {
        self.relations
            .entry(anchor.to_string())
            .or_default()
            .entry(neighbor.to_string())
            .or_default()
            .record(orientation);
    }

    pub fn get(&self, anchor: &str, neighbor: &str) -> Option<&OrientationCounts> {
        self.relations.get(anchor)?.get(neighbor)
    }

    pub fn neighbors(&self, anchor: &str) -> Option<&HashMap<String, OrientationCounts>> {
        self.relations.get(anchor)
    }

    /// Number of anchor phrases with at least one relation.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Number of distinct (anchor, neighbor) pairs.
    pub fn relation_count(&self) -> usize {
        self.relations.values().map(HashMap::len).sum()
    }
}

/// Phrases tracked by the reordering collector, keyed by stemmed phrase.
#[derive(Debug, Clone, Default)]
pub struct PhraseVocabulary {
    phrases: HashMap<String, u64>,
    longest: usize,
}

impl PhraseVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a phrase with its corpus frequency (used for sub-sampling).
    pub fn insert(&mut self, phrase: &str, frequency: u64, normalizer: &Normalizer) {
        let stem = normalizer.stem_phrase(phrase);
        if stem.is_empty() {
            return;
        }
        self.longest = self.longest.max(stem.split(' ').count());
        self.phrases.insert(stem, frequency);
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.phrases.contains_key(stem)
    }

    pub fn frequency(&self, stem: &str) -> u64 {
        self.phrases.get(stem).copied().unwrap_or(0)
    }

    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.phrases.keys().map(String::as_str)
    }

    /// Phrases `tokenizer` can never produce, sorted.
    pub fn unmatchable(&self, tokenizer: &Tokenizer) -> Vec<&str> {
        let mut phrases: Vec<&str> = self.phrases().filter(|p| !tokenizer.admits(p)).collect();
        phrases.sort_unstable();
        phrases
    }

    /// Token length of the longest tracked phrase.
    pub fn longest(&self) -> usize {
        self.longest
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}
