// Seed translation dictionary and character transliteration table.
//
// Both are auxiliary lookups consulted read-only by scorers. Loading them from
// disk is the caller's business; here they are built in memory.

use std::collections::HashMap;

use crate::text::Normalizer;

/// Source stem -> target stems, in insertion order without duplicates.
#[derive(Debug, Clone, Default)]
pub struct SeedDictionary {
    entries: HashMap<String, Vec<String>>,
}

impl SeedDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from surface-form pairs, stemming each side with its own normalizer.
    pub fn from_pairs<'a, I>(pairs: I, source: &Normalizer, target: &Normalizer) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut dict = Self::new();
        for (src, tgt) in pairs {
            dict.insert(source.stem_phrase(src), target.stem_phrase(tgt));
        }
        dict
    }

    /// Add a translation. Returns false if the pair was already known or either side is empty.
    pub fn insert(&mut self, source_stem: impl Into<String>, target_stem: impl Into<String>) -> bool {
        let source_stem = source_stem.into();
        let target_stem = target_stem.into();
        if source_stem.is_empty() || target_stem.is_empty() {
            return false;
        }
        let targets = self.entries.entry(source_stem).or_default();
        if targets.contains(&target_stem) {
            return false;
        }
        targets.push(target_stem);
        true
    }

    pub fn translations(&self, source_stem: &str) -> &[String] {
        self.entries
            .get(source_stem)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of source entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-character replacement table, e.g. Cyrillic to Latin.
#[derive(Debug, Clone, Default)]
pub struct Transliterator {
    table: HashMap<char, String>,
}

impl Transliterator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (char, S)>,
        S: Into<String>,
    {
        Self {
            table: pairs.into_iter().map(|(c, s)| (c, s.into())).collect(),
        }
    }

    pub fn insert(&mut self, from: char, to: impl Into<String>) {
        self.table.insert(from, to.into());
    }

    /// Replace every mapped character; unmapped characters pass through.
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match self.table.get(&c) {
                Some(replacement) => out.push_str(replacement),
                None => out.push(c),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_dedupes_translations() {
        let norm = Normalizer::default();
        let dict = SeedDictionary::from_pairs(
            [("Haus", "house"), ("haus", "House"), ("Haus", "home")],
            &norm,
            &norm,
        );
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.translations("haus"), ["house", "home"]);
        assert!(dict.translations("hund").is_empty());
    }

    #[test]
    fn test_transliterate_passes_unmapped_through() {
        let tr = Transliterator::from_pairs([('д', "d"), ('ж', "zh"), ('о', "o")]);
        assert_eq!(tr.apply("жод-1"), "zhod-1");
    }
}
