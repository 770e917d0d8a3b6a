// Day-indexed corpus access for temporal collection.

use std::io::BufRead;

use anyhow::Result;
use chrono::NaiveDate;

/// A corpus split into consecutive days.
///
/// The cursor starts before the first day; call `advance` to move onto it.
pub trait DayCorpus {
    /// Move to the next day. Returns false once the corpus is exhausted.
    fn advance(&mut self) -> Result<bool>;

    /// The day the cursor is on, if any.
    fn current_day(&self) -> Option<NaiveDate>;

    /// A line reader over the current day's text.
    fn reader(&mut self) -> Result<Box<dyn BufRead + '_>>;
}

/// In-memory corpus of (day, text) pairs, visited in date order.
#[derive(Debug, Clone, Default)]
pub struct MemoryDayCorpus {
    days: Vec<(NaiveDate, String)>,
    cursor: Option<usize>,
}

impl MemoryDayCorpus {
    pub fn new<I, S>(days: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, S)>,
        S: Into<String>,
    {
        let mut days: Vec<(NaiveDate, String)> =
            days.into_iter().map(|(d, text)| (d, text.into())).collect();
        days.sort_by_key(|(d, _)| *d);
        Self { days, cursor: None }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Move the cursor back before the first day.
    pub fn rewind(&mut self) {
        self.cursor = None;
    }
}

impl DayCorpus for MemoryDayCorpus {
    fn advance(&mut self) -> Result<bool> {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.days.len() {
            self.cursor = Some(next);
            Ok(true)
        } else {
            self.cursor = Some(self.days.len());
            Ok(false)
        }
    }

    fn current_day(&self) -> Option<NaiveDate> {
        self.cursor
            .and_then(|c| self.days.get(c))
            .map(|(day, _)| *day)
    }

    fn reader(&mut self) -> Result<Box<dyn BufRead + '_>> {
        match self.cursor.and_then(|c| self.days.get(c)) {
            Some((_, text)) => Ok(Box::new(text.as_bytes())),
            None => anyhow::bail!("No current day; call advance() first"),
        }
    }
}
