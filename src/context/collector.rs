// ContextCollector: the windowed scan that fills context bags.
//
// For every tracked word or phrase spanning tokens [s, e), the tokens in
// [s-L, s) and [e, e+R) of the same sentence are offered to that item's bag. Windows are
// computed over one sentence's token array, so they never cross a sentence
// boundary.

use std::io::BufRead;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::item::{ItemSet, Vocabulary};
use crate::text::{Normalizer, Tokenizer};

/// Counters reported by one collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub sentences: usize,
    /// Tokens that matched a tracked item
    pub item_occurrences: usize,
    /// Window tokens accepted into a bag (new or incremented)
    pub context_hits: usize,
}

/// Builds context bags for a set of tracked items.
#[derive(Debug, Clone)]
pub struct ContextCollector {
    tokenizer: Tokenizer,
    normalizer: Normalizer,
    left: usize,
    right: usize,
}

impl ContextCollector {
    pub fn new(tokenizer: Tokenizer, normalizer: Normalizer, left: usize, right: usize) -> Self {
        Self {
            tokenizer,
            normalizer,
            left,
            right,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Tokenizer::from_config(config),
            Normalizer::from_config(config),
            config.context_left,
            config.context_right,
        )
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Scan `reader` and add window neighbors to the bags of `items`.
    ///
    /// Bags are created on demand and accumulate across calls, so a corpus can
    /// be fed in several readers.
    pub fn collect<R: BufRead>(
        &self,
        items: &mut ItemSet,
        vocabulary: &Vocabulary,
        reader: R,
    ) -> Result<CollectionStats> {
        let mut stats = CollectionStats::default();
        items.warn_unmatchable(&self.tokenizer);

        let sentences = self
            .tokenizer
            .scan(reader, |tokens| {
                let (occurrences, hits) = self.collect_sentence(items, vocabulary, tokens);
                stats.item_occurrences += occurrences;
                stats.context_hits += hits;
            })
            .context("Context collection failed")?;
        stats.sentences = sentences;

        info!(
            side = ?items.side(),
            sentences = stats.sentences,
            occurrences = stats.item_occurrences,
            context_hits = stats.context_hits,
            "Collected context bags"
        );
        Ok(stats)
    }

    fn collect_sentence(
        &self,
        items: &mut ItemSet,
        vocabulary: &Vocabulary,
        tokens: &[&str],
    ) -> (usize, usize) {
        let stems: Vec<String> = tokens.iter().map(|t| self.normalizer.stem(t)).collect();
        let spans = items.spans(&stems);
        let mut hits = 0;

        for span in &spans {
            let Some(item) = items.get_mut(&span.stem) else {
                continue;
            };
            let bag = item.context_mut();
            let before = span.start.saturating_sub(self.left)..span.start;
            let after = span.end..span.end.saturating_add(self.right).min(tokens.len());
            for j in before.chain(after) {
                if bag.add_context_term(tokens[j], &stems[j], vocabulary).is_some() {
                    hits += 1;
                }
            }
        }
        (spans.len(), hits)
    }
}
