//! Date-scoped replacement of persisted chart rows.

pub mod memory;
pub mod rest;

use chrono::NaiveDate;
use log::{info, warn};

use crate::schema::{ChartEntry, WriteMode};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Store rejected the request with {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Batch for {expected} contains an entry dated {found}")]
    DateMismatch {
        expected: NaiveDate,
        found: NaiveDate,
    },
    #[error("{0} cannot be used as a store base URL")]
    InvalidBaseUrl(url::Url),
    #[error("Store unavailable: {0}")]
    Unavailable(&'static str),
}

/// A collection-addressed row store.
#[allow(async_fn_in_trait)]
pub trait ChartStore {
    async fn delete_chart_date(&self, collection: &str, date: NaiveDate) -> Result<(), StoreError>;

    async fn write(
        &self,
        collection: &str,
        entries: &[ChartEntry],
        mode: WriteMode,
    ) -> Result<(), StoreError>;
}

/// Replaces the rows of `collection` dated `chart_date` with `entries`.
///
/// A failed delete is only logged and the write is attempted anyway.
/// A failed write is returned.
pub async fn reconcile<S: ChartStore>(
    store: &S,
    collection: &str,
    chart_date: NaiveDate,
    entries: &[ChartEntry],
    mode: WriteMode,
) -> Result<(), StoreError> {
    if let Some(entry) = entries.iter().find(|e| e.chart_date != chart_date) {
        return Err(StoreError::DateMismatch {
            expected: chart_date,
            found: entry.chart_date,
        });
    }
    if entries.is_empty() {
        info!("Nothing to write to {collection} for {chart_date}.");
        return Ok(());
    }
    if let Err(e) = store.delete_chart_date(collection, chart_date).await {
        warn!("Failed to clear {collection} rows of {chart_date}, writing anyway: {e}");
    }
    store.write(collection, entries, mode).await?;
    info!(
        "Wrote {} rows to {collection} for {chart_date}.",
        entries.len()
    );
    Ok(())
}
