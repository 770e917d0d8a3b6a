// PairScorer: applies every registered Scorer to every candidate pair in parallel.
//
// Pairs are handed out as `&mut ScoredPair` through the chunked processor, so
// each feature record is owned by exactly one worker for the duration of its
// chunk. Scorers and item sets are only read.

use anyhow::{Context, Result};
use tracing::info;

use super::processor::{CancellationToken, ChunkedProcessor, RunSummary};
use super::record::ScoredPair;
use crate::config::Config;
use crate::error::Error;
use crate::item::ItemSet;
use crate::scoring::Scorer;

pub struct PairScorer {
    processor: ChunkedProcessor,
    scorers: Vec<Box<dyn Scorer>>,
}

impl PairScorer {
    /// Fails with `InvalidArgument` on zero workers or an empty scorer list,
    /// before any thread is started.
    pub fn new(workers: usize, scorers: Vec<Box<dyn Scorer>>) -> crate::Result<Self> {
        if scorers.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one scorer is required".to_string(),
            ));
        }
        Ok(Self {
            processor: ChunkedProcessor::new(workers)?.with_label("pairs"),
            scorers,
        })
    }

    pub fn from_config(config: &Config, scorers: Vec<Box<dyn Scorer>>) -> crate::Result<Self> {
        let mut scorer = Self::new(config.workers, scorers)?;
        scorer.processor = scorer
            .processor
            .with_chunk_size(config.chunk_size)
            .with_progress_bar(config.progress_bar);
        Ok(scorer)
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.processor = self.processor.with_chunk_size(chunk_size);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.processor = self.processor.with_cancellation(token);
        self
    }

    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.processor = self.processor.with_progress_bar(enabled);
        self
    }

    pub fn scorers(&self) -> &[Box<dyn Scorer>] {
        &self.scorers
    }

    /// Feature names with their direction (`true` = smaller is better).
    pub fn directions(&self) -> Vec<(&str, bool)> {
        self.scorers
            .iter()
            .map(|s| (s.name(), s.smaller_is_better()))
            .collect()
    }

    /// Run every scorer's `prepare` hook over every item in `items`.
    pub fn prepare(&self, items: &mut ItemSet) -> Result<()> {
        for item in items.iter_mut() {
            for scorer in &self.scorers {
                scorer.prepare(item).with_context(|| {
                    format!("Scorer {} failed to prepare {:?}", scorer.name(), item.term.stem)
                })?;
            }
        }
        info!(side = ?items.side(), items = items.len(), "Prepared items for scoring");
        Ok(())
    }

    /// Fill the feature record of every pair. Blocks until all workers are done.
    ///
    /// A pair whose items are missing, or for which a scorer fails, is logged
    /// and counted in `RunSummary::failed`; features from scorers that did
    /// succeed are still written.
    pub fn estimate(
        &self,
        source: &ItemSet,
        target: &ItemSet,
        pairs: &mut [ScoredPair],
    ) -> RunSummary {
        let total = pairs.len();
        self.processor.run(pairs.iter_mut(), total, |scored| {
            self.score_pair(source, target, scored)
        })
    }

    fn score_pair(&self, source: &ItemSet, target: &ItemSet, scored: &mut ScoredPair) -> Result<()> {
        let a = source
            .get(&scored.pair.source)
            .with_context(|| format!("Unknown source item {:?}", scored.pair.source))?;
        let b = target
            .get(&scored.pair.target)
            .with_context(|| format!("Unknown target item {:?}", scored.pair.target))?;

        let mut first_error = None;
        for scorer in &self.scorers {
            match scorer.score(a, b) {
                Ok(value) => scored.features.set(scorer.name(), value),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e.context(format!(
                            "Scorer {} failed on ({:?}, {:?})",
                            scorer.name(),
                            scored.pair.source,
                            scored.pair.target
                        )));
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
