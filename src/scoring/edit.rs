// Orthographic similarity: normalized edit distance between surface forms.

use anyhow::Result;

use super::traits::Scorer;
use crate::dictionary::Transliterator;
use crate::item::Item;

/// Levenshtein distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Edit distance divided by the longer string's length; lower is better.
#[derive(Debug, Clone, Default)]
pub struct EditDistanceScorer {
    transliterator: Option<Transliterator>,
}

impl EditDistanceScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transliterate both surfaces before comparing (for differing scripts).
    pub fn with_transliteration(transliterator: Transliterator) -> Self {
        Self {
            transliterator: Some(transliterator),
        }
    }

    fn surface(&self, item: &Item) -> String {
        let lowered = item.term.surface.to_lowercase();
        match &self.transliterator {
            Some(t) => t.apply(&lowered),
            None => lowered,
        }
    }
}

impl Scorer for EditDistanceScorer {
    fn name(&self) -> &str {
        "edit"
    }

    fn smaller_is_better(&self) -> bool {
        true
    }

    fn score(&self, source: &Item, target: &Item) -> Result<f64> {
        let a = self.surface(source);
        let b = self.surface(target);
        let longest = a.chars().count().max(b.chars().count());
        if longest == 0 {
            return Ok(0.0);
        }
        Ok(levenshtein(&a, &b) as f64 / longest as f64)
    }
}
