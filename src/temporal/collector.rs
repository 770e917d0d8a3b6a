// TemporalHistogramCollector: turns a day-indexed corpus into one histogram per item.
//
// Each day is scanned with the shared tokenizer into a stem -> count map
// (tracked words and phrases only). Days that produce no counts are skipped without
// consuming a window slot. A circular buffer holds the last W day maps:
//
//   Fixed:   once W days are buffered, emit one bin per item (sum over the
//            window) and start a fresh window.
//   Sliding: once W days are buffered, emit one bin per item for every further
//            day, dropping the oldest day each time.
//
// Every tracked item receives a bin at each emission (zero if absent), so all
// histograms in a set share the same length and bin calendar. A pass refuses
// to start if any histogram is already normalized. A trailing partial fixed
// window is discarded.

use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info};

use super::corpus::DayCorpus;
use crate::config::{Config, WindowMode};
use crate::error::HistogramError;
use crate::item::ItemSet;
use crate::text::{Normalizer, Tokenizer};

/// The emission day of every bin produced by one collection pass, in bin order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedBins {
    pub days: Vec<NaiveDate>,
}

impl CollectedBins {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Builds temporal histograms for a set of tracked items.
#[derive(Debug, Clone)]
pub struct TemporalHistogramCollector {
    tokenizer: Tokenizer,
    normalizer: Normalizer,
    window: usize,
    mode: WindowMode,
}

impl TemporalHistogramCollector {
    /// `window` is clamped to at least one day.
    pub fn new(tokenizer: Tokenizer, normalizer: Normalizer, window: usize, mode: WindowMode) -> Self {
        Self {
            tokenizer,
            normalizer,
            window: window.max(1),
            mode,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Tokenizer::from_config(config),
            Normalizer::from_config(config),
            config.time_window,
            config.window_mode,
        )
    }

    /// Walk `corpus` to the end, appending one bin per emission to every item in `items`.
    pub fn collect<C>(&self, items: &mut ItemSet, corpus: &mut C) -> Result<CollectedBins>
    where
        C: DayCorpus + ?Sized,
    {
        ensure_all_raw(items)?;
        items.warn_unmatchable(&self.tokenizer);

        let mut buffer: VecDeque<HashMap<String, u64>> = VecDeque::with_capacity(self.window + 1);
        let mut collected = CollectedBins::default();
        let mut skipped_days = 0usize;

        while corpus.advance()? {
            let day = corpus
                .current_day()
                .context("Corpus advanced but reports no current day")?;
            let counts = {
                let reader = corpus.reader()?;
                self.count_day(items, reader)
                    .with_context(|| format!("Failed to scan day {day}"))?
            };

            if counts.is_empty() {
                skipped_days += 1;
                continue;
            }

            buffer.push_back(counts);
            if buffer.len() > self.window {
                buffer.pop_front();
            }
            if buffer.len() < self.window {
                continue;
            }

            emit(items, &buffer).with_context(|| format!("Failed to emit bin for {day}"))?;
            collected.days.push(day);
            debug!(%day, bins = collected.len(), "Emitted temporal bin");

            if self.mode == WindowMode::Fixed {
                buffer.clear();
            }
        }

        info!(
            side = ?items.side(),
            bins = collected.len(),
            skipped_days,
            window = self.window,
            mode = ?self.mode,
            "Collected temporal histograms"
        );
        Ok(collected)
    }

    fn count_day(
        &self,
        items: &ItemSet,
        reader: Box<dyn std::io::BufRead + '_>,
    ) -> Result<HashMap<String, u64>> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        self.tokenizer.scan(reader, |tokens| {
            let stems: Vec<String> = tokens.iter().map(|t| self.normalizer.stem(t)).collect();
            for span in items.spans(&stems) {
                *counts.entry(span.stem).or_insert(0) += 1;
            }
        })?;
        Ok(counts)
    }
}

/// Every histogram must still accept bins, otherwise an emission would stop
/// halfway and leave the set with unequal lengths.
fn ensure_all_raw(items: &ItemSet) -> Result<()> {
    let mut frozen: Vec<&str> = items
        .iter()
        .filter(|item| item.temporal.as_ref().is_some_and(|h| h.is_normalized()))
        .map(|item| item.stem())
        .collect();
    if frozen.is_empty() {
        return Ok(());
    }
    frozen.sort_unstable();
    Err(HistogramError::AlreadyNormalized { op: "add a bin" })
        .with_context(|| format!("Normalized histograms cannot be extended: {frozen:?}"))
}

fn emit(items: &mut ItemSet, window: &VecDeque<HashMap<String, u64>>) -> Result<()> {
    for item in items.iter_mut() {
        let total: u64 = window
            .iter()
            .map(|day| day.get(item.stem()).copied().unwrap_or(0))
            .sum();
        let stem = item.term.stem.clone();
        item.temporal_mut()
            .add_bin(total)
            .with_context(|| format!("Histogram of {stem:?} rejected a new bin"))?;
    }
    Ok(())
}

/// Bin indices each side must drop so that only days collected on both sides remain.
pub fn alignment_removals(a: &[NaiveDate], b: &[NaiveDate]) -> (Vec<usize>, Vec<usize>) {
    let in_a: HashSet<NaiveDate> = a.iter().copied().collect();
    let in_b: HashSet<NaiveDate> = b.iter().copied().collect();

    let drop_a = a
        .iter()
        .enumerate()
        .filter(|(_, d)| !in_b.contains(d))
        .map(|(i, _)| i)
        .collect();
    let drop_b = b
        .iter()
        .enumerate()
        .filter(|(_, d)| !in_a.contains(d))
        .map(|(i, _)| i)
        .collect();
    (drop_a, drop_b)
}

/// Align the histograms of two item sets onto their shared days.
///
/// Must run before normalization. Returns the shared calendar.
pub fn align_item_sets(
    a_items: &mut ItemSet,
    a_bins: &CollectedBins,
    b_items: &mut ItemSet,
    b_bins: &CollectedBins,
) -> Result<CollectedBins> {
    let (drop_a, drop_b) = alignment_removals(&a_bins.days, &b_bins.days);
    remove_from_all(a_items, &drop_a)?;
    remove_from_all(b_items, &drop_b)?;

    let dropped: HashSet<usize> = drop_a.iter().copied().collect();
    let shared = CollectedBins {
        days: a_bins
            .days
            .iter()
            .enumerate()
            .filter(|(i, _)| !dropped.contains(i))
            .map(|(_, d)| *d)
            .collect(),
    };
    info!(
        shared = shared.len(),
        dropped_a = drop_a.len(),
        dropped_b = drop_b.len(),
        "Aligned temporal calendars"
    );
    Ok(shared)
}

fn remove_from_all(items: &mut ItemSet, indices: &[usize]) -> Result<()> {
    for item in items.iter_mut() {
        if let Some(histogram) = item.temporal.as_mut() {
            histogram
                .remove_bins(indices)
                .with_context(|| format!("Cannot align histogram of {:?}", item.term.stem))?;
        }
    }
    Ok(())
}

/// Normalize every histogram in `items`.
pub fn normalize_all(items: &mut ItemSet) {
    for histogram in items.iter_mut().filter_map(|item| item.temporal.as_mut()) {
        histogram.normalize();
    }
}
