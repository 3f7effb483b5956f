use chart_scraping_utils::regex;
use chrono::NaiveDate;
use regex::{Captures, Regex};

use crate::metric;

const TEMPLATES: [&str; 2] = ["%d %B %Y", "%d %b %Y"];

/// Finds the chart edition date in the flattened page text.
///
/// Tried in order: a day-first range (`14 November 2025 - 20 November 2025`,
/// the start wins), a `Week of November 22, 2025` banner, then any lone
/// day-first date. Returns `None` when nothing parses.
pub fn resolve(page_text: &str) -> Option<NaiveDate> {
    let text = page_text.replace('\u{a0}', " ");
    let patterns: [&Regex; 3] = [
        regex!(
            r"(?i)\b(?P<day>\d{1,2})(?:st|nd|rd|th)?\s+(?P<month>[a-z]{3,9})\.?,?\s+(?P<year>\d{4})\s*(?:-|–|—|to)\s*\d{1,2}(?:st|nd|rd|th)?\s+[a-z]{3,9}\.?,?\s+\d{4}"
        ),
        regex!(
            r"(?i)\bweek\s+of\s+(?P<month>[a-z]{3,9})\.?\s+(?P<day>\d{1,2})(?:st|nd|rd|th)?,?\s+(?P<year>\d{4})"
        ),
        regex!(
            r"(?i)\b(?P<day>\d{1,2})(?:st|nd|rd|th)?\s+(?P<month>[a-z]{3,9})\.?,?\s+(?P<year>\d{4})\b"
        ),
    ];
    patterns
        .iter()
        .find_map(|pattern| pattern.captures_iter(&text).find_map(|c| parse_candidate(&c)))
}

fn parse_candidate(captures: &Captures) -> Option<NaiveDate> {
    let day = metric::normalize(&captures["day"])?;
    let year = metric::normalize(&captures["year"])?;
    let candidate = format!("{day} {} {year}", &captures["month"]);
    TEMPLATES
        .iter()
        .find_map(|template| NaiveDate::parse_from_str(&candidate, template).ok())
}
