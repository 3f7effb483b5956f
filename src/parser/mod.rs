//! Recovers chart entries from a fetched page.
//!
//! Page markup is not stable, so extraction runs a fixed cascade of
//! independent strategies and commits to the first one that recognizes the
//! page. Results of different strategies are never mixed.

pub mod anchor;
pub mod container;
pub mod document;
pub mod flat_text;

use chrono::NaiveDate;
use log::{debug, info, warn};
use scraper::{ElementRef, Html};

use crate::{
    chart_date,
    schema::{ChartEntry, EntryKind, UNKNOWN_ARTIST},
};

use self::document::Token;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("The page body was empty.")]
    EmptyDocument,
}

/// Parse context of one fetched page, consumed by a single extraction.
pub struct ChartPage {
    html: Html,
    tokens: Vec<Token>,
    text: String,
    resolved_date: Option<NaiveDate>,
    fallback_date: NaiveDate,
}

impl ChartPage {
    /// Parses `markup` and resolves its chart date, attaching `fallback_date`
    /// when the page does not state one.
    pub fn parse(markup: &str, fallback_date: NaiveDate) -> Result<Self, ParseError> {
        if markup.trim().is_empty() {
            return Err(ParseError::EmptyDocument);
        }
        let html = Html::parse_document(markup);
        let tokens = document::tokenize(&html);
        let text = document::flatten(&tokens);
        let resolved_date = chart_date::resolve(&text);
        Ok(Self {
            html,
            tokens,
            text,
            resolved_date,
            fallback_date,
        })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Readable page lines joined by `\n`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The date stated on the page, if any.
    pub fn resolved_date(&self) -> Option<NaiveDate> {
        self.resolved_date
    }

    pub fn chart_date(&self) -> NaiveDate {
        self.resolved_date.unwrap_or(self.fallback_date)
    }

    /// Repeating item blocks, from the first container marker that matches.
    pub fn containers(&self) -> Vec<ElementRef<'_>> {
        container::discover(&self.html)
    }
}

/// Raw fields of one item, before defaults are applied.
#[derive(Default, Debug)]
pub struct Candidate {
    /// 0-based position of the item in discovery order.
    pub position: usize,
    pub rank: Option<u32>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub last_week_rank: Option<u32>,
    pub peak_rank: Option<u32>,
    pub weeks_on_chart: Option<u32>,
    pub cover_image_url: Option<String>,
}

impl Candidate {
    fn into_entry(self, kind: EntryKind, chart_date: NaiveDate) -> ChartEntry {
        let present = |x: Option<String>| x.map(|x| x.trim().to_owned()).filter(|x| !x.is_empty());
        ChartEntry {
            kind,
            chart_date,
            rank: self
                .rank
                .filter(|&rank| rank >= 1)
                .unwrap_or(self.position as u32 + 1),
            title: present(self.title).unwrap_or_else(|| kind.unknown_title().to_owned()),
            artist: present(self.artist).unwrap_or_else(|| UNKNOWN_ARTIST.to_owned()),
            last_week_rank: self.last_week_rank,
            peak_rank: self.peak_rank,
            weeks_on_chart: self.weeks_on_chart,
            cover_image_url: kind
                .has_cover_art()
                .then_some(self.cover_image_url)
                .flatten(),
        }
    }
}

/// A strategy returns `None` when it does not recognize the page and
/// `Some(candidates)` (possibly empty) once it commits to it.
pub type Strategy = fn(&ChartPage, EntryKind) -> Option<Vec<Candidate>>;

/// Highest priority first.
pub const STRATEGIES: [(&str, Strategy); 4] = [
    ("structured container", container::structured),
    ("labeled metric", container::labeled),
    ("anchor sequence", anchor::extract),
    ("flat text", flat_text::extract),
];

/// Extracts the entries of `page` in discovery order.
///
/// An unrecognized page yields an empty list, which is a normal outcome.
pub fn extract(page: &ChartPage, kind: EntryKind) -> Vec<ChartEntry> {
    let Some((name, candidates)) = STRATEGIES
        .iter()
        .find_map(|(name, strategy)| strategy(page, kind).map(|found| (*name, found)))
    else {
        warn!("No extraction strategy recognized the page.");
        return vec![];
    };
    info!("Using {name} strategy: {} candidates.", candidates.len());
    let chart_date = page.chart_date();
    candidates
        .into_iter()
        .inspect(|c| debug!("{c:?}"))
        .map(|candidate| candidate.into_entry(kind, chart_date))
        .collect()
}
