use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

/// How the temporal collector advances over days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// Emit one bin per full window, then start a fresh window.
    Fixed,
    /// Emit one bin per day once the window is full, replacing the oldest day.
    Sliding,
}

/// Central configuration loaded from environment variables.
///
/// Every value has a default, so an empty environment yields a usable
/// configuration. A `.env` file is picked up automatically by `load()`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Worker threads for pair scoring
    pub workers: usize,
    /// Pairs popped from the shared queue per lock acquisition
    pub chunk_size: usize,
    /// Tokens to the left of an item that count as context
    pub context_left: usize,
    /// Tokens to the right of an item that count as context
    pub context_right: usize,
    /// Tokens shorter than this (in chars) are dropped before windowing
    pub min_token_chars: usize,
    /// Optional prefix stemmer length
    pub stem_prefix: Option<usize>,
    /// Days aggregated into one temporal bin
    pub time_window: usize,
    pub window_mode: WindowMode,
    /// Max tokens between two phrases for a discontinuous relation
    pub reorder_max_distance: usize,
    /// Longest phrase (in tokens) looked up by the reordering collector
    pub reorder_max_phrase: usize,
    /// Frequency above which adjacent relations are sub-sampled
    pub reorder_subsample: Option<u64>,
    /// Draw an indicatif progress bar while scoring pairs
    pub progress_bar: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            chunk_size: 1000,
            context_left: 3,
            context_right: 3,
            min_token_chars: 2,
            stem_prefix: None,
            time_window: 1,
            window_mode: WindowMode::Fixed,
            reorder_max_distance: 3,
            reorder_max_phrase: 3,
            reorder_subsample: None,
            progress_bar: false,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn load() -> Result<Self> {
        // Silently ignore a missing .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults; set-but-malformed keys are an error
    /// naming the variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let window_mode = match parse_var::<bool, _>(&lookup, "LEXMINE_TIME_SLIDING")? {
            Some(true) => WindowMode::Sliding,
            _ => WindowMode::Fixed,
        };

        let config = Self {
            workers: parse_var(&lookup, "LEXMINE_WORKERS")?.unwrap_or(defaults.workers),
            chunk_size: parse_var(&lookup, "LEXMINE_CHUNK_SIZE")?.unwrap_or(defaults.chunk_size),
            context_left: parse_var(&lookup, "LEXMINE_CONTEXT_LEFT")?
                .unwrap_or(defaults.context_left),
            context_right: parse_var(&lookup, "LEXMINE_CONTEXT_RIGHT")?
                .unwrap_or(defaults.context_right),
            min_token_chars: parse_var(&lookup, "LEXMINE_MIN_TOKEN_CHARS")?
                .unwrap_or(defaults.min_token_chars),
            stem_prefix: parse_var(&lookup, "LEXMINE_STEM_PREFIX")?,
            time_window: parse_var(&lookup, "LEXMINE_TIME_WINDOW")?
                .unwrap_or(defaults.time_window),
            window_mode,
            reorder_max_distance: parse_var(&lookup, "LEXMINE_REORDER_MAX_DISTANCE")?
                .unwrap_or(defaults.reorder_max_distance),
            reorder_max_phrase: parse_var(&lookup, "LEXMINE_REORDER_MAX_PHRASE")?
                .unwrap_or(defaults.reorder_max_phrase),
            reorder_subsample: parse_var(&lookup, "LEXMINE_REORDER_SUBSAMPLE")?,
            progress_bar: parse_var(&lookup, "LEXMINE_PROGRESS_BAR")?
                .unwrap_or(defaults.progress_bar),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make a component unusable.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("LEXMINE_WORKERS must be at least 1");
        }
        if self.chunk_size == 0 {
            anyhow::bail!("LEXMINE_CHUNK_SIZE must be at least 1");
        }
        if self.time_window == 0 {
            anyhow::bail!("LEXMINE_TIME_WINDOW must be at least 1");
        }
        if self.reorder_max_phrase == 0 {
            anyhow::bail!("LEXMINE_REORDER_MAX_PHRASE must be at least 1");
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
    }
}
