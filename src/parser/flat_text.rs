//! Last resort: the page text split on `Number <n>` rank markers.

use chart_scraping_utils::regex;
use itertools::Itertools;
use log::debug;
use regex::Regex;

use super::{Candidate, ChartPage};
use crate::{metric, schema::EntryKind};

const NOISE_PREFIXES: [&str; 4] = [
    "Image:",
    "view as",
    "Official Singles Chart",
    "Official Albums Chart",
];

pub(super) fn rank_marker() -> &'static Regex {
    regex!(r"\bNumber\s+(\d+)\b")
}

/// Last week, peak and weeks-on-chart found by their `LW:` / `Peak:` /
/// `Weeks:` labels. Callers pass only the text of one entry.
pub(super) fn scan_metrics(text: &str) -> (Option<u32>, Option<u32>, Option<u32>) {
    let value = |pattern: &Regex| {
        pattern
            .captures(text)
            .and_then(|captures| metric::normalize(&captures[1]))
    };
    (
        value(regex!(r"(?i)\bLW:\s*([0-9][0-9,]*|New|RE)")),
        value(regex!(r"(?i)\bPeak:\s*([0-9][0-9,]*)")),
        value(regex!(r"(?i)\bWeeks:\s*([0-9][0-9,]*)")),
    )
}

fn is_metric_line(line: &str) -> bool {
    regex!(r"(?i)^(?:LW|Peak|Weeks):").is_match(line)
}

fn is_noise(line: &str) -> bool {
    NOISE_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) || line.contains("cover art")
}

pub fn extract(page: &ChartPage, _kind: EntryKind) -> Option<Vec<Candidate>> {
    let text = page.text();
    let markers = rank_marker().captures_iter(text).collect_vec();
    if markers.is_empty() {
        return None;
    }
    let bounds = markers
        .iter()
        .filter_map(|captures| Some((captures.get(0)?, captures.get(1)?.as_str())))
        .collect_vec();
    let candidates = bounds
        .iter()
        .enumerate()
        .filter_map(|(position, (marker, rank))| {
            let end = bounds
                .get(position + 1)
                .map_or(text.len(), |(next, _)| next.start());
            let body = &text[marker.end()..end];
            let mut lines = body
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .skip_while(|line| is_noise(line));
            let (Some(title), Some(artist)) = (lines.next(), lines.next()) else {
                debug!("Skipping rank marker #{position}: fewer than two lines.");
                return None;
            };
            let (last_week_rank, peak_rank, weeks_on_chart) = scan_metrics(body);
            Some(Candidate {
                position,
                rank: metric::normalize(rank),
                title: Some(title.to_owned()),
                artist: (!is_metric_line(artist)).then(|| artist.to_owned()),
                last_week_rank,
                peak_rank,
                weeks_on_chart,
                cover_image_url: None,
            })
        })
        .collect();
    Some(candidates)
}

#[cfg(test)]
mod tests {
    use super::{extract, scan_metrics};
    use crate::{
        parser::{tests::today, ChartPage},
        schema::EntryKind,
    };

    const UK_TEXT: &str = "<div>
        <p>Official Singles Chart Top 100</p>
        <p>14 November 2025 - 20 November 2025</p>
        <p>Number 1</p><p>Image: The Fate of Ophelia cover art</p>
        <p>THE FATE OF OPHELIA</p><p>TAYLOR SWIFT</p>
        <p>LW:</p><p>1</p><p>Peak:</p><p>1</p><p>Weeks:</p><p>6</p>
        <p>Number 2</p><p>Official Singles Chart</p>
        <p>WHERE IS MY HUSBAND</p><p>RAYE</p>
        <p>LW: RE</p><p>Peak: 2</p>
        <p>Number 3</p><p>Advertisement</p>
        <p>Number 4</p><p>GOLDEN</p><p>HUNTR/X</p><p>LW: 1,</p><p>Weeks: 12</p>
    </div>";

    #[test]
    fn splits_on_rank_markers() {
        let page = ChartPage::parse(UK_TEXT, today()).unwrap();
        let candidates = extract(&page, EntryKind::Song).unwrap();
        assert_eq!(candidates.len(), 3);
        let c = &candidates[0];
        assert_eq!(c.rank, Some(1));
        assert_eq!(c.title.as_deref(), Some("THE FATE OF OPHELIA"));
        assert_eq!(c.artist.as_deref(), Some("TAYLOR SWIFT"));
        assert_eq!((c.last_week_rank, c.peak_rank, c.weeks_on_chart), (Some(1), Some(1), Some(6)));

        let c = &candidates[1];
        assert_eq!(c.title.as_deref(), Some("WHERE IS MY HUSBAND"));
        assert_eq!((c.last_week_rank, c.peak_rank, c.weeks_on_chart), (None, Some(2), None));

        // The advert under "Number 3" has a single line and is skipped.
        let c = &candidates[2];
        assert_eq!((c.position, c.rank), (3, Some(4)));
        assert_eq!((c.last_week_rank, c.weeks_on_chart), (Some(1), Some(12)));
    }

    #[test]
    fn metric_line_is_not_an_artist() {
        let page = ChartPage::parse(
            "<p>Number 1</p><p>Solo Title</p><p>LW: 3</p><p>Peak: 1</p>",
            today(),
        )
        .unwrap();
        let candidates = extract(&page, EntryKind::Song).unwrap();
        assert_eq!(candidates[0].title.as_deref(), Some("Solo Title"));
        assert_eq!(candidates[0].artist, None);
        assert_eq!(candidates[0].last_week_rank, Some(3));
    }

    #[test]
    fn metrics_are_case_insensitive() {
        assert_eq!(scan_metrics("lw: new\npeak: 40\nWEEKS: 2"), (None, Some(40), Some(2)));
        assert_eq!(scan_metrics("nothing"), (None, None, None));
    }

    #[test]
    fn no_marker_no_commit() {
        let page = ChartPage::parse("<p>Just an article</p>", today()).unwrap();
        assert!(extract(&page, EntryKind::Song).is_none());
    }
}
