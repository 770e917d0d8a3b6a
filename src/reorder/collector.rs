// ReorderingCollector: scans sentences for phrase occurrences and their relative positions.

use std::io::BufRead;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use super::{Orientation, PhraseVocabulary, ReorderingTable};
use crate::config::Config;
use crate::text::{Normalizer, Tokenizer};

/// A phrase occurrence spanning tokens `[start, end)`.
#[derive(Debug, Clone)]
struct Occurrence {
    start: usize,
    end: usize,
    phrase: String,
}

impl Occurrence {
    fn contains(&self, other: &Occurrence) -> bool {
        self.start <= other.start
            && other.end <= self.end
            && (self.end - self.start) > (other.end - other.start)
    }
}

/// Builds a reordering table from a monolingual corpus.
#[derive(Debug, Clone)]
pub struct ReorderingCollector {
    tokenizer: Tokenizer,
    normalizer: Normalizer,
    max_phrase_len: usize,
    max_distance: usize,
    longest_only: bool,
    subsample_threshold: Option<u64>,
    seed: u64,
}

impl ReorderingCollector {
    pub fn new(tokenizer: Tokenizer, normalizer: Normalizer) -> Self {
        Self {
            tokenizer,
            normalizer,
            max_phrase_len: 3,
            max_distance: 3,
            longest_only: false,
            subsample_threshold: None,
            seed: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Tokenizer::from_config(config), Normalizer::from_config(config))
            .with_max_phrase_len(config.reorder_max_phrase)
            .with_max_distance(config.reorder_max_distance)
            .with_subsampling(config.reorder_subsample)
    }

    pub fn with_max_phrase_len(mut self, max_phrase_len: usize) -> Self {
        self.max_phrase_len = max_phrase_len.max(1);
        self
    }

    /// Largest token gap still counted as a discontinuous relation.
    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Keep only the longest neighbor among nested candidates of the same orientation.
    pub fn longest_only(mut self, longest_only: bool) -> Self {
        self.longest_only = longest_only;
        self
    }

    /// Anchors more frequent than `threshold` keep an adjacent relation with
    /// probability `threshold / frequency`.
    pub fn with_subsampling(mut self, threshold: Option<u64>) -> Self {
        self.subsample_threshold = threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn collect<R: BufRead>(
        &self,
        vocabulary: &PhraseVocabulary,
        reader: R,
    ) -> Result<ReorderingTable> {
        let unmatchable = vocabulary.unmatchable(&self.tokenizer);
        if !unmatchable.is_empty() {
            warn!(
                count = unmatchable.len(),
                examples = ?&unmatchable[..unmatchable.len().min(5)],
                "Phrases the tokenizer can never produce will have no relations"
            );
        }

        let mut table = ReorderingTable::new();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let max_len = self.max_phrase_len.min(vocabulary.longest().max(1));

        let sentences = self
            .tokenizer
            .scan(reader, |tokens| {
                let occurrences = self.find_occurrences(vocabulary, tokens, max_len);
                self.record_sentence(vocabulary, &occurrences, &mut table, &mut rng);
            })
            .context("Reordering collection failed")?;

        info!(
            sentences,
            anchors = table.len(),
            relations = table.relation_count(),
            "Collected reordering relations"
        );
        Ok(table)
    }

    fn find_occurrences(
        &self,
        vocabulary: &PhraseVocabulary,
        tokens: &[&str],
        max_len: usize,
    ) -> Vec<Occurrence> {
        let stems: Vec<String> = tokens.iter().map(|t| self.normalizer.stem(t)).collect();
        let mut occurrences = Vec::new();
        for start in 0..stems.len() {
            for len in 1..=max_len.min(stems.len() - start) {
                let phrase = stems[start..start + len].join(" ");
                if vocabulary.contains(&phrase) {
                    occurrences.push(Occurrence {
                        start,
                        end: start + len,
                        phrase,
                    });
                }
            }
        }
        occurrences
    }

    fn classify(&self, anchor: &Occurrence, other: &Occurrence) -> Option<Orientation> {
        if other.end == anchor.start {
            Some(Orientation::Before)
        } else if other.start == anchor.end {
            Some(Orientation::After)
        } else if other.start > anchor.end {
            (other.start - anchor.end <= self.max_distance).then_some(Orientation::Discontinuous)
        } else if other.end < anchor.start {
            (anchor.start - other.end <= self.max_distance).then_some(Orientation::Discontinuous)
        } else {
            // Overlapping occurrences are not neighbors
            None
        }
    }

    fn record_sentence(
        &self,
        vocabulary: &PhraseVocabulary,
        occurrences: &[Occurrence],
        table: &mut ReorderingTable,
        rng: &mut StdRng,
    ) {
        for (i, anchor) in occurrences.iter().enumerate() {
            let candidates: Vec<(&Occurrence, Orientation)> = occurrences
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .filter_map(|(_, other)| self.classify(anchor, other).map(|o| (other, o)))
                .collect();

            let keep_probability = self.keep_probability(vocabulary.frequency(&anchor.phrase));

            for &(neighbor, orientation) in &candidates {
                if self.longest_only
                    && candidates
                        .iter()
                        .any(|&(other, o)| o == orientation && other.contains(neighbor))
                {
                    continue;
                }
                let adjacent = orientation != Orientation::Discontinuous;
                if adjacent && keep_probability < 1.0 && !rng.random_bool(keep_probability) {
                    continue;
                }
                table.record(&anchor.phrase, &neighbor.phrase, orientation);
            }
        }
    }

    fn keep_probability(&self, frequency: u64) -> f64 {
        match self.subsample_threshold {
            Some(threshold) if frequency > threshold => threshold as f64 / frequency as f64,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(phrases: &[(&str, u64)]) -> PhraseVocabulary {
        let norm = Normalizer::default();
        let mut v = PhraseVocabulary::new();
        for (p, f) in phrases {
            v.insert(p, *f, &norm);
        }
        v
    }

    fn collector() -> ReorderingCollector {
        ReorderingCollector::new(Tokenizer::default(), Normalizer::default())
    }

    #[test]
    fn test_adjacent_and_discontinuous() {
        let v = vocab(&[("red", 1), ("car", 1), ("fast", 1)]);
        let table = collector()
            .with_max_distance(2)
            .collect(&v, "red car is very fast".as_bytes())
            .unwrap();

        let car_red = table.get("car", "red").unwrap();
        assert_eq!(car_red.before, 1);
        let red_car = table.get("red", "car").unwrap();
        assert_eq!(red_car.after, 1);
        // car(1) .. fast(4): two tokens in between
        assert_eq!(table.get("car", "fast").unwrap().discontinuous, 1);
        // red(0) .. fast(4): three tokens in between, beyond K=2
        assert!(table.get("red", "fast").is_none());
    }

    #[test]
    fn test_distance_counts_tokens_not_characters() {
        let v = vocab(&[("aa", 1), ("bb", 1)]);
        let table = collector()
            .with_max_distance(1)
            .collect(&v, "aa extraordinarily bb".as_bytes())
            .unwrap();
        assert_eq!(table.get("aa", "bb").unwrap().discontinuous, 1);
    }

    #[test]
    fn test_longest_only_drops_nested_neighbor() {
        let v = vocab(&[("new", 1), ("new york", 1), ("in", 1), ("live", 1)]);
        let all = collector()
            .collect(&v, "live in new york".as_bytes())
            .unwrap();
        assert_eq!(all.get("in", "new").unwrap().after, 1);
        assert_eq!(all.get("in", "new york").unwrap().after, 1);

        let longest = collector()
            .longest_only(true)
            .collect(&v, "live in new york".as_bytes())
            .unwrap();
        assert!(longest.get("in", "new").is_none());
        assert_eq!(longest.get("in", "new york").unwrap().after, 1);
    }

    #[test]
    fn test_subsampling_thins_frequent_anchors() {
        let v = vocab(&[("the", 1_000_000), ("cat", 1)]);
        let corpus = "the cat\n".repeat(200);
        let table = collector()
            .with_subsampling(Some(10))
            .with_seed(7)
            .collect(&v, corpus.as_bytes())
            .unwrap();

        let sampled = table.get("the", "cat").map_or(0, |c| c.after);
        assert!(sampled < 20, "expected heavy sub-sampling, kept {sampled}");
        // The rare anchor is never sub-sampled
        assert_eq!(table.get("cat", "the").unwrap().before, 200);
    }
}
