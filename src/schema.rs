use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use strum::EnumIter;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// The charts the scraper knows how to fetch and where each one is stored.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Debug,
    EnumIter,
    strum::Display,
    clap::ValueEnum,
)]
pub enum ChartKind {
    #[strum(serialize = "Hot 100")]
    #[value(name = "hot-100")]
    Hot100,
    #[strum(serialize = "Billboard 200")]
    #[value(name = "billboard-200")]
    Billboard200,
    #[strum(serialize = "UK Singles")]
    #[value(name = "uk-singles")]
    UkSingles,
    #[strum(serialize = "UK Albums")]
    #[value(name = "uk-albums")]
    UkAlbums,
}

impl ChartKind {
    pub fn url(self) -> &'static str {
        match self {
            Self::Hot100 => "https://www.billboard.com/charts/hot-100/",
            Self::Billboard200 => "https://www.billboard.com/charts/billboard-200/",
            Self::UkSingles => "https://www.officialcharts.com/charts/singles-chart/",
            Self::UkAlbums => "https://www.officialcharts.com/charts/albums-chart/",
        }
    }

    pub fn collection(self) -> &'static str {
        match self {
            Self::Hot100 => "hot_100_entries",
            Self::Billboard200 => "billboard_200_entries",
            Self::UkSingles => "uk_singles_entries",
            Self::UkAlbums => "uk_albums_entries",
        }
    }

    pub fn entry_kind(self) -> EntryKind {
        match self {
            Self::Hot100 | Self::UkSingles => EntryKind::Song,
            Self::Billboard200 | Self::UkAlbums => EntryKind::Album,
        }
    }

    pub fn write_mode(self) -> WriteMode {
        match self {
            Self::Hot100 | Self::Billboard200 => WriteMode::Upsert,
            Self::UkSingles | Self::UkAlbums => WriteMode::Insert,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntryKind {
    Song,
    Album,
}

impl EntryKind {
    pub fn unknown_title(self) -> &'static str {
        match self {
            Self::Song => UNKNOWN_TITLE,
            Self::Album => UNKNOWN_ALBUM,
        }
    }

    pub fn has_cover_art(self) -> bool {
        matches!(self, Self::Album)
    }
}

/// How a batch is written once the rows of its chart date are cleared.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WriteMode {
    Insert,
    /// Overwrites rows colliding on `(chart_date, rank)`.
    Upsert,
}

/// One ranked item of one chart edition.
///
/// Serializes to the persisted row shape. Album entries always carry the
/// `cover_image_url` key (possibly `null`); song entries never do.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ChartEntry {
    pub kind: EntryKind,
    pub chart_date: NaiveDate,
    pub rank: u32,
    pub title: String,
    pub artist: String,
    pub last_week_rank: Option<u32>,
    pub peak_rank: Option<u32>,
    pub weeks_on_chart: Option<u32>,
    pub cover_image_url: Option<String>,
}

impl ChartEntry {
    /// Both title and artist fell back to their sentinels.
    pub fn is_unresolved(&self) -> bool {
        matches!(self.title.as_str(), UNKNOWN_TITLE | UNKNOWN_ALBUM) && self.artist == UNKNOWN_ARTIST
    }
}

#[derive(Serialize)]
struct Row<'a> {
    chart_date: NaiveDate,
    rank: u32,
    title: &'a str,
    artist: &'a str,
    last_week_rank: Option<u32>,
    peak_rank: Option<u32>,
    weeks_on_chart: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_image_url: Option<Option<&'a str>>,
}

impl Serialize for ChartEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Row {
            chart_date: self.chart_date,
            rank: self.rank,
            title: &self.title,
            artist: &self.artist,
            last_week_rank: self.last_week_rank,
            peak_rank: self.peak_rank,
            weeks_on_chart: self.weeks_on_chart,
            cover_image_url: self
                .kind
                .has_cover_art()
                .then(|| self.cover_image_url.as_deref()),
        }
        .serialize(serializer)
    }
}
