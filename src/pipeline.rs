//! One chart run: fetch, parse, extract, validate and persist.

use std::collections::HashSet;

use chrono::NaiveDate;
use log::{debug, info, warn};
use typed_builder::TypedBuilder;

use crate::{
    api::{self, FetchError, PageSource},
    parser::{self, ChartPage, ParseError},
    schema::{ChartEntry, ChartKind},
    store::{self, ChartStore, StoreError},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::Display)]
pub enum Stage {
    Idle,
    Fetching,
    Parsing,
    DateResolved,
    Extracting,
    Validated,
    Persisted,
    Aborted,
}

#[derive(Debug)]
pub enum RunOutcome {
    Persisted {
        chart_date: NaiveDate,
        entries: Vec<ChartEntry>,
    },
    /// Nothing worth persisting was found. Not an error.
    Aborted {
        chart_date: NaiveDate,
        reason: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Failed to parse the page: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Persistence failures make the whole run unsuccessful.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

#[derive(TypedBuilder)]
pub struct Pipeline<'a, P, S> {
    source: &'a P,
    store: &'a S,
    /// Chart date used when a page does not state one.
    today: NaiveDate,
}

struct Transitions {
    chart: ChartKind,
    stage: Stage,
}

impl Transitions {
    fn enter(&mut self, next: Stage) {
        debug!("{}: {} -> {next}", self.chart, self.stage);
        self.stage = next;
    }
}

impl<P: PageSource, S: ChartStore> Pipeline<'_, P, S> {
    pub async fn run(&self, chart: ChartKind) -> Result<RunOutcome, PipelineError> {
        let mut transitions = Transitions {
            chart,
            stage: Stage::Idle,
        };
        let result = self.advance(chart, &mut transitions).await;
        if !matches!(result, Ok(RunOutcome::Persisted { .. })) {
            transitions.enter(Stage::Aborted);
        }
        result
    }

    async fn advance(
        &self,
        chart: ChartKind,
        transitions: &mut Transitions,
    ) -> Result<RunOutcome, PipelineError> {
        transitions.enter(Stage::Fetching);
        let url = api::page_url(chart.url())?;
        info!("Fetching {chart} from {url}");
        let markup = self.source.fetch_page(&url).await?;

        transitions.enter(Stage::Parsing);
        let page = ChartPage::parse(&markup, self.today)?;

        transitions.enter(Stage::DateResolved);
        let chart_date = page.chart_date();
        if page.resolved_date().is_none() {
            warn!("{chart}: the page states no chart date, using {chart_date}.");
        }

        transitions.enter(Stage::Extracting);
        let entries = parser::extract(&page, chart.entry_kind());

        transitions.enter(Stage::Validated);
        let entries = validate(entries);
        if entries.is_empty() {
            let reason = "nothing to persist".to_owned();
            info!("{chart} ({chart_date}): {reason}.");
            return Ok(RunOutcome::Aborted { chart_date, reason });
        }

        store::reconcile(
            self.store,
            chart.collection(),
            chart_date,
            &entries,
            chart.write_mode(),
        )
        .await?;
        transitions.enter(Stage::Persisted);
        info!("{chart} ({chart_date}): persisted {} entries.", entries.len());
        Ok(RunOutcome::Persisted {
            chart_date,
            entries,
        })
    }
}

/// Drops entries with neither title nor artist, and repeats of a rank.
fn validate(entries: Vec<ChartEntry>) -> Vec<ChartEntry> {
    let mut ranks = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            if entry.is_unresolved() {
                debug!("Dropping unresolved entry at rank {}.", entry.rank);
                return false;
            }
            if !ranks.insert(entry.rank) {
                warn!("Dropping {:?}: rank {} is already taken.", entry.title, entry.rank);
                return false;
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use reqwest::StatusCode;
    use url::Url;

    use super::{validate, Pipeline, PipelineError, RunOutcome};
    use crate::{
        api::{FetchError, PageSource},
        parser::tests::{billboard_page, today},
        schema::{ChartKind, UNKNOWN_ARTIST, UNKNOWN_TITLE},
        store::{memory::MemoryStore, tests::entries},
    };

    /// Serves the same markup for every url, or fails with 503.
    struct StaticSource(Option<String>);

    impl PageSource for StaticSource {
        async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
            self.0.clone().ok_or_else(|| FetchError::Status {
                url: url.clone(),
                status: StatusCode::SERVICE_UNAVAILABLE,
            })
        }
    }

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn week() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 22).unwrap()
    }

    async fn run(
        markup: Option<&str>,
        store: &MemoryStore,
        chart: ChartKind,
    ) -> Result<RunOutcome, PipelineError> {
        init_logger();
        let source = StaticSource(markup.map(str::to_owned));
        Pipeline::builder()
            .source(&source)
            .store(store)
            .today(today())
            .build()
            .run(chart)
            .await
    }

    #[tokio::test]
    async fn dated_page_without_chart_is_aborted() {
        let store = MemoryStore::default();
        let outcome = run(
            Some("<html><body><p>Week of November 22, 2025</p></body></html>"),
            &store,
            ChartKind::Hot100,
        )
        .await
        .unwrap();
        assert!(matches!(
            outcome,
            RunOutcome::Aborted { chart_date, .. } if chart_date == week()
        ));
        assert!(store.rows("hot_100_entries", week()).is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_is_not_persistence() {
        let store = MemoryStore::default();
        let error = run(None, &store, ChartKind::UkSingles).await.unwrap_err();
        assert!(matches!(error, PipelineError::Fetch(FetchError::Status { .. })));
        assert!(!error.is_persistence());
        let error = run(Some(" "), &store, ChartKind::UkSingles)
            .await
            .unwrap_err();
        assert!(matches!(error, PipelineError::Parse(_)));
    }

    #[tokio::test]
    async fn republished_chart_replaces_the_date() {
        let store = MemoryStore::default();
        run(Some(billboard_page(100).as_str()), &store, ChartKind::Hot100)
            .await
            .unwrap();
        assert_eq!(store.rows("hot_100_entries", week()).len(), 100);
        let outcome = run(Some(billboard_page(90).as_str()), &store, ChartKind::Hot100)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            RunOutcome::Persisted { ref entries, .. } if entries.len() == 90
        ));
        let rows = store.rows("hot_100_entries", week());
        assert_eq!(rows.len(), 90);
        assert_eq!(rows.last().unwrap().rank, 90);
    }

    #[tokio::test]
    async fn album_charts_keep_covers() {
        let store = MemoryStore::default();
        run(Some(billboard_page(3).as_str()), &store, ChartKind::Billboard200)
            .await
            .unwrap();
        let rows = store.rows("billboard_200_entries", week());
        assert_eq!(rows[2].cover_image_url.as_deref(), Some("https://charts/3.jpg"));
    }

    #[tokio::test]
    async fn write_failure_is_persistence() {
        let store = MemoryStore::failing(false, true);
        let error = run(Some(billboard_page(2).as_str()), &store, ChartKind::Hot100)
            .await
            .unwrap_err();
        assert!(error.is_persistence());
    }

    #[tokio::test]
    async fn undated_page_is_stored_under_today() {
        let store = MemoryStore::failing(true, false);
        run(
            Some("<p>Number 1</p><p>Someone Like You</p><p>Adele</p>"),
            &store,
            ChartKind::UkSingles,
        )
        .await
        .unwrap();
        let rows = store.rows("uk_singles_entries", today());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].artist, "Adele");
    }

    #[test]
    fn validation_drops_sentinels_and_repeated_ranks() {
        let mut batch = entries(4);
        batch[1].title = UNKNOWN_TITLE.to_owned();
        batch[1].artist = UNKNOWN_ARTIST.to_owned();
        batch[2].title = UNKNOWN_TITLE.to_owned();
        batch[3].rank = 1;
        let ranks: Vec<_> = validate(batch).iter().map(|e| e.rank).collect();
        assert_eq!(ranks, [1, 3]);
    }
}
