// Context weightings turn raw neighbor counts into scores.

use std::collections::HashMap;

use anyhow::Result;

use super::bag::ContextEntry;
use crate::item::{ItemSet, Term};

/// Assigns a score to one neighbor of one item's context bag.
pub trait ContextWeighting: Send + Sync {
    /// Short identifier recorded on the bags this weighting scored.
    fn name(&self) -> &str;

    fn weigh(&self, owner: &Term, entry: &ContextEntry) -> Result<f64>;
}

/// Score = raw co-occurrence count.
pub struct RawCount;

impl ContextWeighting for RawCount {
    fn name(&self) -> &str {
        "raw-count"
    }

    fn weigh(&self, _owner: &Term, entry: &ContextEntry) -> Result<f64> {
        Ok(entry.count as f64)
    }
}

/// Score = count * ln(N / df), treating every context bag as a document.
///
/// Neighbors that show up around nearly every item (function words that made
/// it into the vocabulary) are pushed towards zero.
pub struct TfIdf {
    doc_freq: HashMap<String, u64>,
    num_docs: u64,
}

impl TfIdf {
    /// Collect document frequencies from every context bag in `items`.
    pub fn from_items(items: &ItemSet) -> Self {
        let mut doc_freq: HashMap<String, u64> = HashMap::new();
        let mut num_docs = 0;
        for bag in items.iter().filter_map(|item| item.context.as_ref()) {
            num_docs += 1;
            for entry in bag.entries() {
                *doc_freq.entry(entry.term.stem.clone()).or_insert(0) += 1;
            }
        }
        Self { doc_freq, num_docs }
    }

    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    pub fn idf(&self, stem: &str) -> f64 {
        let df = self.doc_freq.get(stem).copied().unwrap_or(1).max(1);
        let n = self.num_docs.max(df);
        (n as f64 / df as f64).ln()
    }
}

impl ContextWeighting for TfIdf {
    fn name(&self) -> &str {
        "tf-idf"
    }

    fn weigh(&self, _owner: &Term, entry: &ContextEntry) -> Result<f64> {
        Ok(entry.count as f64 * self.idf(&entry.term.stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Side, Vocabulary};
    use crate::text::Normalizer;

    #[test]
    fn test_tfidf_downweights_ubiquitous_neighbors() {
        let norm = Normalizer::default();
        let mut items = ItemSet::from_surfaces(Side::Source, ["bank", "river", "shore"], &norm);
        let vocab = Vocabulary::from_surfaces(["common", "rare"], &norm);

        for stem in ["bank", "river", "shore"] {
            let bag = items.get_mut(stem).unwrap().context_mut();
            bag.add_context_word("common", &norm, &vocab);
        }
        items
            .get_mut("bank")
            .unwrap()
            .context_mut()
            .add_context_word("rare", &norm, &vocab);

        let tfidf = TfIdf::from_items(&items);
        assert_eq!(tfidf.num_docs(), 3);
        assert_eq!(tfidf.idf("common"), 0.0);
        assert!((tfidf.idf("rare") - 3f64.ln()).abs() < 1e-12);

        let bank = items.get("bank").unwrap();
        let rare = bank.context.as_ref().unwrap().get("rare").unwrap();
        assert!(tfidf.weigh(&bank.term, rare).unwrap() > 1.0);
    }
}
