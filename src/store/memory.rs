use std::{collections::HashMap, sync::Mutex};

use chrono::NaiveDate;
use itertools::Itertools;

use super::{ChartStore, StoreError};
use crate::schema::{ChartEntry, WriteMode};

/// Rows kept in process, keyed by collection.
#[derive(Default, Debug)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<ChartEntry>>>,
    fail_deletes: bool,
    fail_writes: bool,
}

impl MemoryStore {
    /// A store whose deletes and/or writes always fail.
    pub fn failing(deletes: bool, writes: bool) -> Self {
        Self {
            fail_deletes: deletes,
            fail_writes: writes,
            ..Default::default()
        }
    }

    /// Rows of `collection` dated `date`, ordered by rank.
    pub fn rows(&self, collection: &str, date: NaiveDate) -> Vec<ChartEntry> {
        let Ok(collections) = self.collections.lock() else {
            return vec![];
        };
        collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|row| row.chart_date == date)
            .sorted_by_key(|row| row.rank)
            .cloned()
            .collect()
    }

    fn with_rows<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut Vec<ChartEntry>) -> T,
    ) -> Result<T, StoreError> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| StoreError::Unavailable("poisoned"))?;
        Ok(f(collections.entry(collection.to_owned()).or_default()))
    }
}

impl ChartStore for MemoryStore {
    async fn delete_chart_date(&self, collection: &str, date: NaiveDate) -> Result<(), StoreError> {
        if self.fail_deletes {
            return Err(StoreError::Unavailable("delete"));
        }
        self.with_rows(collection, |rows| rows.retain(|row| row.chart_date != date))
    }

    async fn write(
        &self,
        collection: &str,
        entries: &[ChartEntry],
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("write"));
        }
        self.with_rows(collection, |rows| {
            if mode == WriteMode::Upsert {
                rows.retain(|row| {
                    !entries
                        .iter()
                        .any(|e| (e.chart_date, e.rank) == (row.chart_date, row.rank))
                });
            }
            rows.extend_from_slice(entries);
        })
    }
}
