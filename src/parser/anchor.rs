//! Pages whose entries are a rank marker followed by title and artist links.

use log::debug;

use super::{
    document::{Link, Token},
    flat_text::{rank_marker, scan_metrics},
    Candidate, ChartPage,
};
use crate::{metric, schema::EntryKind};

/// Tokens between one rank marker and the next.
struct Segment<'a> {
    rank: &'a str,
    links: Vec<&'a Link>,
    text: String,
}

impl<'a> Segment<'a> {
    fn new(rank: &'a str) -> Self {
        Self {
            rank,
            links: vec![],
            text: String::new(),
        }
    }

    fn push_text(&mut self, text: &str) {
        let text = text.trim();
        if !text.is_empty() {
            self.text.push_str(text);
            self.text.push('\n');
        }
    }
}

fn segments(tokens: &[Token]) -> Vec<Segment<'_>> {
    let mut segments: Vec<Segment> = vec![];
    for token in tokens {
        match token {
            Token::Text(line) => {
                let mut rest = 0;
                for captures in rank_marker().captures_iter(line) {
                    let (Some(marker), Some(rank)) = (captures.get(0), captures.get(1)) else {
                        continue;
                    };
                    if let Some(segment) = segments.last_mut() {
                        segment.push_text(&line[rest..marker.start()]);
                    }
                    segments.push(Segment::new(rank.as_str()));
                    rest = marker.end();
                }
                if let Some(segment) = segments.last_mut() {
                    segment.push_text(&line[rest..]);
                }
            }
            Token::Link(link) => {
                if let Some(segment) = segments.last_mut() {
                    segment.links.push(link);
                    segment.push_text(&link.text);
                }
            }
        }
    }
    segments
}

fn candidate(position: usize, segment: &Segment, kind: EntryKind) -> Option<Candidate> {
    let mut textual = segment
        .links
        .iter()
        .enumerate()
        .filter(|(_, link)| link.is_textual());
    let (Some((title_index, title)), Some((_, artist))) = (textual.next(), textual.next()) else {
        debug!("Skipping rank marker #{position}: fewer than two textual links.");
        return None;
    };
    let cover_image_url = kind
        .has_cover_art()
        .then(|| {
            segment.links[..title_index]
                .iter()
                .rev()
                .find_map(|link| link.image.clone())
        })
        .flatten();
    let (last_week_rank, peak_rank, weeks_on_chart) = scan_metrics(&segment.text);
    Some(Candidate {
        position,
        rank: metric::normalize(segment.rank),
        title: Some(title.text.clone()),
        artist: Some(artist.text.clone()),
        last_week_rank,
        peak_rank,
        weeks_on_chart,
        cover_image_url,
    })
}

/// Recognizes the page only if at least one marker is followed by two
/// textual links before the next marker.
pub fn extract(page: &ChartPage, kind: EntryKind) -> Option<Vec<Candidate>> {
    let candidates: Vec<_> = segments(page.tokens())
        .iter()
        .enumerate()
        .filter_map(|(position, segment)| candidate(position, segment, kind))
        .collect();
    (!candidates.is_empty()).then_some(candidates)
}
