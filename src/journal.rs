use crate::catalog::{MoodCatalog, MoodLabel};
use crate::errors::StorageError;
use crate::storage::JsonFile;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf};

/// One mood per calendar date; recording a date again overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoodLog {
    entries: BTreeMap<NaiveDate, MoodLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub mood: MoodLabel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub rank: usize,
}

impl MoodLog {
    pub fn record(mut self, date: NaiveDate, mood: MoodLabel) -> Self {
        self.entries.insert(date, mood);
        self
    }

    pub fn get(&self, date: NaiveDate) -> Option<MoodLabel> {
        self.entries.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest date first.
    pub fn history_view(&self) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .rev()
            .map(|(date, mood)| HistoryEntry {
                date: *date,
                mood: *mood,
            })
            .collect()
    }

    /// Oldest date first, each mood replaced by its catalog rank.
    pub fn series_view(&self, catalog: &MoodCatalog) -> Vec<SeriesPoint> {
        self.entries
            .iter()
            .filter_map(|(date, mood)| {
                catalog.rank(*mood).map(|rank| SeriesPoint { date: *date, rank })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct MoodStore {
    file: JsonFile<MoodLog>,
}

impl MoodStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    pub async fn load(&self) -> Result<MoodLog, StorageError> {
        self.file.load().await
    }

    pub async fn persist(&self, log: &MoodLog) -> Result<(), StorageError> {
        self.file.persist(log).await
    }
}
