// Delimiter-based sentence and token splitting shared by every collector.
//
// Not a linguistic segmenter: sentences are cut on a delimiter regex (or one
// sentence per line), tokens on another, and anything shorter than the minimum
// token length is dropped before token positions are assigned. Window offsets and reordering distances are measured over the
// surviving tokens.

use std::io::BufRead;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex_lite::Regex;

use crate::config::Config;

/// Sentence-final punctuation followed by whitespace or end of line.
pub static SENTENCE_DELIMITERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.!?;]+(?:\s+|$)").expect("sentence pattern is valid")
});

/// Whitespace and ASCII punctuation runs.
pub static TOKEN_DELIMITERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s[:punct:]]+").expect("token pattern is valid")
});

/// Maps a surface token to the stem used for all identity comparisons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalizer {
    /// Truncate stems to this many characters (a cheap prefix stemmer).
    pub stem_prefix: Option<usize>,
}

impl Normalizer {
    pub fn new(stem_prefix: Option<usize>) -> Self {
        Self { stem_prefix }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.stem_prefix)
    }

    /// Case-fold and optionally truncate a token.
    pub fn stem(&self, token: &str) -> String {
        let folded = token.to_lowercase();
        match self.stem_prefix {
            Some(n) if folded.chars().count() > n => folded.chars().take(n).collect(),
            _ => folded,
        }
    }

    /// Stem every whitespace-separated part of a phrase and rejoin with single spaces.
    pub fn stem_phrase(&self, phrase: &str) -> String {
        phrase
            .split_whitespace()
            .map(|part| self.stem(part))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How a line is cut into sentences.
#[derive(Debug, Clone)]
pub enum SentenceMode {
    /// Every input line is one sentence.
    Lines,
    /// Lines are split further on a delimiter pattern.
    Delimited(Regex),
}

/// Regex-driven sentence and token splitter.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    sentence_mode: SentenceMode,
    token_delimiters: Regex,
    min_token_chars: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            sentence_mode: SentenceMode::Delimited(SENTENCE_DELIMITERS.clone()),
            token_delimiters: TOKEN_DELIMITERS.clone(),
            min_token_chars: 2,
        }
    }
}

impl Tokenizer {
    pub fn from_config(config: &Config) -> Self {
        Self::default().with_min_token_chars(config.min_token_chars)
    }

    /// Treat each line as exactly one sentence.
    pub fn lines_as_sentences(mut self) -> Self {
        self.sentence_mode = SentenceMode::Lines;
        self
    }

    pub fn with_sentence_pattern(mut self, pattern: &str) -> crate::Result<Self> {
        self.sentence_mode = SentenceMode::Delimited(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn with_token_pattern(mut self, pattern: &str) -> crate::Result<Self> {
        self.token_delimiters = Regex::new(pattern)?;
        Ok(self)
    }

    pub fn with_min_token_chars(mut self, min_token_chars: usize) -> Self {
        self.min_token_chars = min_token_chars;
        self
    }

    /// Split one line into trimmed, non-empty sentences.
    pub fn sentences<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match &self.sentence_mode {
            SentenceMode::Lines => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    Vec::new()
                } else {
                    vec![trimmed]
                }
            }
            SentenceMode::Delimited(re) => re
                .split(line)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Split a sentence into tokens, dropping blanks and tokens below the minimum length.
    pub fn tokens<'a>(&self, sentence: &'a str) -> Vec<&'a str> {
        self.token_delimiters
            .split(sentence)
            .filter(|t| !t.is_empty() && t.chars().count() >= self.min_token_chars)
            .collect()
    }

    /// Whether a stemmed word or phrase can ever come out of this tokenizer.
    ///
    /// False when any whitespace-separated part would be split further or
    /// dropped as too short, such as "a lot" with a minimum length of 2.
    pub fn admits(&self, stem: &str) -> bool {
        let mut parts = stem.split_whitespace().peekable();
        if parts.peek().is_none() {
            return false;
        }
        parts.all(|part| self.tokens(part) == [part])
    }

    /// Stream a reader sentence by sentence, handing each non-empty token array to `visit`.
    ///
    /// Returns the number of sentences visited. Blank lines and sentences that
    /// tokenize to nothing are skipped silently.
    pub fn scan<R, F>(&self, reader: R, mut visit: F) -> Result<usize>
    where
        R: BufRead,
        F: FnMut(&[&str]),
    {
        let mut sentences = 0;
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read corpus line {}", line_no + 1))?;
            for sentence in self.sentences(&line) {
                let tokens = self.tokens(sentence);
                if tokens.is_empty() {
                    continue;
                }
                visit(&tokens);
                sentences += 1;
            }
        }
        Ok(sentences)
    }
}
