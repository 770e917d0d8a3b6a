// Items: the words and phrases whose similarity signals are mined.
//
// An item's identity is its stem. Everything else it carries (context bag,
// temporal histogram, corpus frequency) is attached by the collectors across
// several passes and mutated in place.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::io::BufRead;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::ContextBag;
use crate::temporal::TemporalHistogram;
use crate::text::{Normalizer, Tokenizer};

/// Surface form plus the stem that defines equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
    pub surface: String,
    pub stem: String,
}

impl Term {
    pub fn new(surface: impl Into<String>, stem: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            stem: stem.into(),
        }
    }

    /// Build a term whose stem is derived from the surface form.
    pub fn from_surface(surface: &str, normalizer: &Normalizer) -> Self {
        Self::new(surface, normalizer.stem_phrase(surface))
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.stem == other.stem
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.stem.hash(state);
    }
}

/// Which monolingual collection an item was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Source,
    Target,
}

/// A tracked word or phrase with its lazily attached signals.
#[derive(Debug, Clone)]
pub struct Item {
    pub term: Term,
    pub side: Side,
    /// Occurrences counted by `count_frequencies`
    pub frequency: u64,
    pub context: Option<ContextBag>,
    pub temporal: Option<TemporalHistogram>,
}

impl Item {
    pub fn new(term: Term, side: Side) -> Self {
        Self {
            term,
            side,
            frequency: 0,
            context: None,
            temporal: None,
        }
    }

    pub fn stem(&self) -> &str {
        &self.term.stem
    }

    /// The context bag, created empty on first access.
    pub fn context_mut(&mut self) -> &mut ContextBag {
        self.context.get_or_insert_with(ContextBag::new)
    }

    /// The temporal histogram, created empty on first access.
    pub fn temporal_mut(&mut self) -> &mut TemporalHistogram {
        self.temporal.get_or_insert_with(TemporalHistogram::new)
    }
}

/// One occurrence of a tracked item over the token range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpan {
    pub start: usize,
    pub end: usize,
    pub stem: String,
}

/// A side-tagged collection of items keyed by stem.
#[derive(Debug, Clone)]
pub struct ItemSet {
    side: Side,
    items: HashMap<String, Item>,
    /// Token length of the longest tracked stem
    longest: usize,
}

fn token_len(stem: &str) -> usize {
    stem.split(' ').count()
}

impl ItemSet {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            items: HashMap::new(),
            longest: 0,
        }
    }

    /// Build a set from surface forms, stemming each with `normalizer`.
    /// Surfaces that collapse to the same stem keep the first surface seen.
    pub fn from_surfaces<'a, I>(side: Side, surfaces: I, normalizer: &Normalizer) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = Self::new(side);
        for surface in surfaces {
            set.insert(Term::from_surface(surface, normalizer));
        }
        set
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Track a term. Returns false if its stem was already present.
    pub fn insert(&mut self, term: Term) -> bool {
        if self.items.contains_key(&term.stem) || term.stem.is_empty() {
            return false;
        }
        let stem = term.stem.clone();
        self.longest = self.longest.max(token_len(&stem));
        self.items.insert(stem, Item::new(term, self.side));
        true
    }

    /// Token length of the longest tracked stem (0 when empty).
    pub fn longest(&self) -> usize {
        self.longest
    }

    /// Every tracked word or phrase in a sentence of stemmed tokens.
    ///
    /// Phrases are matched as runs of up to `longest()` consecutive tokens
    /// joined by single spaces, so overlapping items ("new", "new york") are
    /// each reported.
    pub fn spans(&self, stems: &[String]) -> Vec<ItemSpan> {
        let mut spans = Vec::new();
        for start in 0..stems.len() {
            for len in 1..=self.longest.min(stems.len() - start) {
                let candidate = stems[start..start + len].join(" ");
                if self.items.contains_key(&candidate) {
                    spans.push(ItemSpan {
                        start,
                        end: start + len,
                        stem: candidate,
                    });
                }
            }
        }
        spans
    }

    pub fn get(&self, stem: &str) -> Option<&Item> {
        self.items.get(stem)
    }

    pub fn get_mut(&mut self, stem: &str) -> Option<&mut Item> {
        self.items.get_mut(stem)
    }

    pub fn contains_stem(&self, stem: &str) -> bool {
        self.items.contains_key(stem)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Item> {
        self.items.values_mut()
    }

    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Keep only the items matching `keep`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Item) -> bool,
    {
        self.items.retain(|_, item| keep(item));
        self.recompute_longest();
    }

    /// Drop items seen fewer than `min` times. Returns how many were dropped.
    pub fn retain_min_frequency(&mut self, min: u64) -> usize {
        let before = self.items.len();
        self.items.retain(|_, item| item.frequency >= min);
        let dropped = before - self.items.len();
        self.recompute_longest();
        debug!(side = ?self.side, dropped, kept = self.items.len(), "Pruned by frequency");
        dropped
    }

    /// Log the items `tokenizer` can never produce, e.g. single-character
    /// words under the default minimum token length. Returns their count.
    pub fn warn_unmatchable(&self, tokenizer: &Tokenizer) -> usize {
        let unmatchable: Vec<&str> = self.stems().filter(|s| !tokenizer.admits(s)).collect();
        if !unmatchable.is_empty() {
            warn!(
                side = ?self.side,
                count = unmatchable.len(),
                examples = ?&unmatchable[..unmatchable.len().min(5)],
                "Items can never match a token sequence and will collect nothing"
            );
        }
        unmatchable.len()
    }

    fn recompute_longest(&mut self) {
        self.longest = self.items.keys().map(|s| token_len(s)).max().unwrap_or(0);
    }
}

/// The closed set of stems allowed to enter a context bag.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    stems: HashSet<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_surfaces<'a, I>(surfaces: I, normalizer: &Normalizer) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            stems: surfaces
                .into_iter()
                .map(|s| normalizer.stem_phrase(s))
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Use the stems of an item set as the vocabulary.
    pub fn from_items(items: &ItemSet) -> Self {
        Self {
            stems: items.stems().map(str::to_string).collect(),
        }
    }

    pub fn insert_stem(&mut self, stem: impl Into<String>) {
        self.stems.insert(stem.into());
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.stems.contains(stem)
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }
}

/// Count occurrences of every tracked word or phrase and store them on the items.
///
/// Counts accumulate onto any frequency already present, so several corpus
/// readers can be fed in sequence. Returns the number of sentences scanned.
pub fn count_frequencies<R: BufRead>(
    items: &mut ItemSet,
    reader: R,
    tokenizer: &Tokenizer,
    normalizer: &Normalizer,
) -> Result<usize> {
    items.warn_unmatchable(tokenizer);
    let mut counts: HashMap<String, u64> = HashMap::new();
    let sentences = tokenizer.scan(reader, |tokens| {
        let stems: Vec<String> = tokens.iter().map(|t| normalizer.stem(t)).collect();
        for span in items.spans(&stems) {
            *counts.entry(span.stem).or_insert(0) += 1;
        }
    })?;

    for (stem, count) in counts {
        if let Some(item) = items.get_mut(&stem) {
            item.frequency += count;
        }
    }
    Ok(sentences)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_equality_is_by_stem() {
        let a = Term::new("Bank", "bank");
        let b = Term::new("BANK", "bank");
        assert_eq!(a, b);
        let set: HashSet<Term> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_insert_rejects_duplicate_stem() {
        let norm = Normalizer::default();
        let mut set = ItemSet::new(Side::Source);
        assert!(set.insert(Term::from_surface("River", &norm)));
        assert!(!set.insert(Term::from_surface("river", &norm)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("river").unwrap().term.surface, "River");
    }

    #[test]
    fn test_count_frequencies_and_prune() {
        let norm = Normalizer::default();
        let tok = Tokenizer::default();
        let mut set = ItemSet::from_surfaces(Side::Source, ["bank", "river", "loan"], &norm);
        let corpus = "The bank lent money. The bank is by the river.\nBank holidays.";
        count_frequencies(&mut set, corpus.as_bytes(), &tok, &norm).unwrap();

        assert_eq!(set.get("bank").unwrap().frequency, 3);
        assert_eq!(set.get("river").unwrap().frequency, 1);
        assert_eq!(set.get("loan").unwrap().frequency, 0);

        assert_eq!(set.retain_min_frequency(1), 1);
        assert!(!set.contains_stem("loan"));
    }

    #[test]
    fn test_phrase_items_are_counted() {
        let norm = Normalizer::default();
        let tok = Tokenizer::default();
        let mut set = ItemSet::from_surfaces(Side::Source, ["New York", "york"], &norm);
        assert_eq!(set.longest(), 2);
        count_frequencies(&mut set, "new york new york. York".as_bytes(), &tok, &norm).unwrap();

        assert_eq!(set.get("new york").unwrap().frequency, 2);
        assert_eq!(set.get("york").unwrap().frequency, 3);
    }

    #[test]
    fn test_spans_report_overlapping_items() {
        let norm = Normalizer::default();
        let set = ItemSet::from_surfaces(Side::Source, ["new", "new york", "city"], &norm);
        let stems: Vec<String> = ["new", "york", "city"].iter().map(|s| s.to_string()).collect();
        let spans = set.spans(&stems);
        let found: Vec<(usize, usize, &str)> = spans
            .iter()
            .map(|s| (s.start, s.end, s.stem.as_str()))
            .collect();
        assert_eq!(found, vec![(0, 1, "new"), (0, 2, "new york"), (2, 3, "city")]);
    }

    #[test]
    fn test_retain_shrinks_longest() {
        let norm = Normalizer::default();
        let mut set = ItemSet::from_surfaces(Side::Source, ["new york city", "bank"], &norm);
        assert_eq!(set.longest(), 3);
        set.retain(|item| item.stem() == "bank");
        assert_eq!(set.longest(), 1);
    }

    #[test]
    fn test_unmatchable_items_are_reported() {
        let norm = Normalizer::default();
        let set = ItemSet::from_surfaces(Side::Target, ["a lot", "x", "bank"], &norm);
        assert_eq!(set.warn_unmatchable(&Tokenizer::default()), 2);
        let permissive = Tokenizer::default().with_min_token_chars(1);
        assert_eq!(set.warn_unmatchable(&permissive), 0);
    }

    #[test]
    fn test_lazy_properties() {
        let mut item = Item::new(Term::new("x", "x"), Side::Target);
        assert!(item.context.is_none());
        item.context_mut();
        item.temporal_mut();
        assert!(item.context.is_some());
        assert!(item.temporal.is_some());
    }
}
