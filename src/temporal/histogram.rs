// TemporalHistogram: occurrence counts of one item over discrete time bins.
//
// A histogram is built raw (one bin per emitted window), optionally resized or
// aligned, then normalized. Normalization divides by the total occurrence
// count, caches the sum and sum of squares, and freezes the bin count: every
// size-changing operation afterwards is rejected.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::HistogramError;

type Result<T> = std::result::Result<T, HistogramError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalHistogram {
    bins: Vec<f64>,
    /// Total occurrences across all bins, kept from before normalization
    count: f64,
    normalized: bool,
    sum: f64,
    sum_sq: f64,
}

impl TemporalHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a raw histogram from per-bin counts.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let bins: Vec<f64> = counts.into_iter().map(|c| c as f64).collect();
        let count = bins.iter().sum();
        Self {
            bins,
            count,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// Total occurrence count (the normalization denominator).
    pub fn count(&self) -> f64 {
        self.count
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Sum of the normalized bins; `None` before normalization.
    pub fn sum(&self) -> Option<f64> {
        self.normalized.then_some(self.sum)
    }

    /// Sum of squared normalized bins; `None` before normalization.
    pub fn sum_sq(&self) -> Option<f64> {
        self.normalized.then_some(self.sum_sq)
    }

    /// Append one raw bin.
    pub fn add_bin(&mut self, count: u64) -> Result<()> {
        self.ensure_raw("add a bin")?;
        self.bins.push(count as f64);
        self.count += count as f64;
        Ok(())
    }

    /// Divide every bin by the total count. Calling it again changes nothing.
    ///
    /// A histogram with no occurrences stays all-zero.
    pub fn normalize(&mut self) {
        if self.normalized {
            return;
        }
        if self.count > 0.0 {
            for bin in &mut self.bins {
                *bin /= self.count;
            }
        }
        self.sum = self.bins.iter().sum();
        self.sum_sq = self.bins.iter().map(|b| b * b).sum();
        self.normalized = true;
    }

    /// Truncate, or pad with zero bins, to `new_size`.
    pub fn set_size_crop(&mut self, new_size: usize) -> Result<()> {
        if new_size == self.bins.len() {
            return Ok(());
        }
        self.ensure_raw("crop")?;
        self.bins.resize(new_size, 0.0);
        self.recount();
        Ok(())
    }

    /// Resample proportionally to `new_size` bins.
    ///
    /// Destination bin i covers the source interval [i*s, (i+1)*s) with
    /// s = old/new. Every source bin k overlapping it contributes its weight
    /// times the overlap length, so mass is redistributed rather than sampled.
    pub fn set_size_scale(&mut self, new_size: usize) -> Result<()> {
        let old_size = self.bins.len();
        if new_size == old_size {
            return Ok(());
        }
        self.ensure_raw("rescale")?;

        if old_size == 0 || new_size == 0 {
            self.bins = vec![0.0; new_size];
            self.recount();
            return Ok(());
        }

        let scale = old_size as f64 / new_size as f64;
        let scaled: Vec<f64> = (0..new_size)
            .map(|i| {
                let lo = i as f64 * scale;
                let hi = (i + 1) as f64 * scale;
                let first = lo.floor() as usize;
                let last = (hi.ceil() as usize).min(old_size);
                (first..last)
                    .map(|k| {
                        let overlap = (k as f64 + 1.0).min(hi) - (k as f64).max(lo);
                        if overlap > 0.0 {
                            self.bins[k] * overlap
                        } else {
                            0.0
                        }
                    })
                    .sum()
            })
            .collect();

        self.bins = scaled;
        self.recount();
        Ok(())
    }

    /// Drop the bins at `indices` (duplicates ignored).
    pub fn remove_bins(&mut self, indices: &[usize]) -> Result<()> {
        if indices.is_empty() {
            return Ok(());
        }
        self.ensure_raw("remove bins")?;
        let len = self.bins.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(HistogramError::BinOutOfRange { index, len });
        }

        let drop: BTreeSet<usize> = indices.iter().copied().collect();
        self.bins = std::mem::take(&mut self.bins)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !drop.contains(i))
            .map(|(_, b)| b)
            .collect();
        self.recount();
        Ok(())
    }

    /// Combine two normalized histograms of equal size.
    ///
    /// Raw counts are reconstructed as `bin * count` on each side. A result bin
    /// is zero when either side's count is zero there, otherwise the larger of
    /// the two counts. The result is normalized.
    pub fn merge_distros(a: &Self, b: &Self) -> Result<Self> {
        if !a.normalized || !b.normalized {
            return Err(HistogramError::NotNormalized);
        }
        if a.len() != b.len() {
            return Err(HistogramError::SizeMismatch {
                left: a.len(),
                right: b.len(),
            });
        }

        let bins: Vec<f64> = a
            .bins
            .iter()
            .zip(&b.bins)
            .map(|(x, y)| {
                let raw_a = x * a.count;
                let raw_b = y * b.count;
                if raw_a == 0.0 || raw_b == 0.0 {
                    0.0
                } else {
                    raw_a.max(raw_b)
                }
            })
            .collect();

        let mut merged = Self {
            count: bins.iter().sum(),
            bins,
            ..Self::default()
        };
        merged.normalize();
        Ok(merged)
    }

    fn ensure_raw(&self, op: &'static str) -> Result<()> {
        if self.normalized {
            Err(HistogramError::AlreadyNormalized { op })
        } else {
            Ok(())
        }
    }

    fn recount(&mut self) {
        self.count = self.bins.iter().sum();
    }
}

/// Cosine similarity of two normalized histograms.
///
/// With `restrict`, only the listed bin indices take part (indices beyond the
/// histogram length are ignored). Zero-magnitude histograms score 0.0.
pub fn cosine(
    a: &TemporalHistogram,
    b: &TemporalHistogram,
    restrict: Option<&BTreeSet<usize>>,
) -> Result<f64> {
    if !a.normalized || !b.normalized {
        return Err(HistogramError::NotNormalized);
    }
    if a.len() != b.len() {
        return Err(HistogramError::SizeMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (dot, norm_a, norm_b) = match restrict {
        None => {
            let dot: f64 = a.bins.iter().zip(&b.bins).map(|(x, y)| x * y).sum();
            (dot, a.sum_sq, b.sum_sq)
        }
        Some(indices) => indices
            .iter()
            .filter(|&&i| i < a.len())
            .fold((0.0, 0.0, 0.0), |(dot, na, nb), &i| {
                let (x, y) = (a.bins[i], b.bins[i]);
                (dot + x * y, na + x * x, nb + y * y)
            }),
    };

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        Ok(0.0)
    } else {
        Ok((dot / denom).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_bin_tracks_count() {
        let mut h = TemporalHistogram::new();
        h.add_bin(3).unwrap();
        h.add_bin(1).unwrap();
        assert_eq!(h.bins(), &[3.0, 1.0]);
        assert_eq!(h.count(), 4.0);
        assert!(h.sum().is_none());
    }

    #[test]
    fn test_add_bin_after_normalize_fails() {
        let mut h = TemporalHistogram::from_counts([1, 1]);
        h.normalize();
        assert_eq!(
            h.add_bin(1),
            Err(HistogramError::AlreadyNormalized { op: "add a bin" })
        );
    }

    #[test]
    fn test_zero_histogram_normalizes_to_zero() {
        let mut h = TemporalHistogram::from_counts([0, 0, 0]);
        h.normalize();
        assert_eq!(h.bins(), &[0.0, 0.0, 0.0]);
        assert_eq!(h.sum(), Some(0.0));
    }

    #[test]
    fn test_crop_pads_and_truncates() {
        let mut h = TemporalHistogram::from_counts([1, 2, 3]);
        h.set_size_crop(5).unwrap();
        assert_eq!(h.bins(), &[1.0, 2.0, 3.0, 0.0, 0.0]);
        h.set_size_crop(2).unwrap();
        assert_eq!(h.bins(), &[1.0, 2.0]);
        assert_eq!(h.count(), 3.0);
    }

    #[test]
    fn test_upscale_spreads_mass() {
        let mut h = TemporalHistogram::from_counts([4, 8]);
        h.set_size_scale(4).unwrap();
        assert_eq!(h.bins(), &[2.0, 2.0, 4.0, 4.0]);
        assert_eq!(h.count(), 12.0);
    }

    #[test]
    fn test_fractional_scale_splits_boundary_bin() {
        // 3 -> 2: scale 1.5, bin 1 of the source straddles both destinations
        let mut h = TemporalHistogram::from_counts([2, 4, 6]);
        h.set_size_scale(2).unwrap();
        assert_eq!(h.bins(), &[4.0, 8.0]);
    }

    #[test]
    fn test_remove_bins_out_of_range() {
        let mut h = TemporalHistogram::from_counts([1, 2]);
        assert_eq!(
            h.remove_bins(&[2]),
            Err(HistogramError::BinOutOfRange { index: 2, len: 2 })
        );
        h.remove_bins(&[0, 0]).unwrap();
        assert_eq!(h.bins(), &[2.0]);
    }

    #[test]
    fn test_cosine_restricted() {
        let mut a = TemporalHistogram::from_counts([1, 0, 5]);
        let mut b = TemporalHistogram::from_counts([1, 3, 0]);
        a.normalize();
        b.normalize();
        let only_first: BTreeSet<usize> = [0].into();
        assert!((cosine(&a, &b, Some(&only_first)).unwrap() - 1.0).abs() < 1e-12);
        assert!(cosine(&a, &b, None).unwrap() < 0.2);
    }
}
