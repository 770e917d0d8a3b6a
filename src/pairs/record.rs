// Candidate pairs and the per-pair feature records the workers fill in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A (source stem, target stem) candidate translation pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidatePair {
    pub source: String,
    pub target: String,
}

impl CandidatePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Named feature values for one pair, written only by the worker that owns the pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecord {
    values: BTreeMap<String, f64>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// A pair together with its feature slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPair {
    pub pair: CandidatePair,
    pub features: FeatureRecord,
}

impl ScoredPair {
    pub fn new(pair: CandidatePair) -> Self {
        Self {
            pair,
            features: FeatureRecord::new(),
        }
    }

    /// Wrap every pair with an empty feature record.
    pub fn from_pairs<I>(pairs: I) -> Vec<Self>
    where
        I: IntoIterator<Item = CandidatePair>,
    {
        pairs.into_iter().map(Self::new).collect()
    }
}
