//! Strategies for pages made of repeating item blocks.

use chart_scraping_utils::{regex, selector, selectors};
use itertools::Itertools;
use log::debug;
use scraper::{ElementRef, Html, Selector};

use super::{
    document::{element_text, image_source},
    Candidate, ChartPage,
};
use crate::{metric, schema::EntryKind};

/// Item block markers, most current layout first.
fn container_markers() -> &'static [Selector] {
    selectors!(
        "ul.o-chart-results-list-row",
        "li.o-chart-results-list__item",
        "li.chart-list__element",
        "div.chart-list-item",
    )
}

/// The blocks of the first container marker that matches at all.
pub fn discover(html: &Html) -> Vec<ElementRef<'_>> {
    container_markers()
        .iter()
        .map(|marker| html.select(marker).collect_vec())
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

#[derive(Clone, Copy, Debug)]
enum Metric {
    LastWeek,
    Peak,
    Weeks,
}

impl Metric {
    const ALL: [Metric; 3] = [Metric::LastWeek, Metric::Peak, Metric::Weeks];

    fn label(self) -> &'static str {
        match self {
            Metric::LastWeek => "LW",
            Metric::Peak => "PEAK",
            Metric::Weeks => "WEEKS",
        }
    }

    fn markers(self) -> &'static [Selector] {
        match self {
            Metric::LastWeek => selectors!(".text--last", r#"[data-metric="last-week"]"#),
            Metric::Peak => selectors!(".text--peak", r#"[data-metric="peak"]"#),
            Metric::Weeks => selectors!(".text--week", r#"[data-metric="weeks"]"#),
        }
    }

    fn is_label(self, text: &str) -> bool {
        text.trim().trim_end_matches(':').eq_ignore_ascii_case(self.label())
    }
}

fn is_metric_label(text: &str) -> bool {
    Metric::ALL.iter().any(|metric| metric.is_label(text))
}

/// Containers whose metrics sit in dedicated marker elements.
pub fn structured(page: &ChartPage, kind: EntryKind) -> Option<Vec<Candidate>> {
    let containers = page.containers();
    let has_markers = containers.iter().any(|container| {
        Metric::ALL
            .iter()
            .any(|metric| first_match(*container, metric.markers()).is_some())
    });
    if !has_markers {
        return None;
    }
    committed(collect(&containers, kind, |container, metric| {
        first_match(container, metric.markers())
            .and_then(|element| metric::normalize(&element_text(element)))
    }))
}

/// Containers whose metrics follow `LW` / `PEAK` / `WEEKS` label elements.
pub fn labeled(page: &ChartPage, kind: EntryKind) -> Option<Vec<Candidate>> {
    let containers = page.containers();
    if containers.is_empty() {
        return None;
    }
    committed(collect(&containers, kind, labeled_metric))
}

/// Containers that held no item at all leave the page to later strategies.
fn committed(candidates: Vec<Candidate>) -> Option<Vec<Candidate>> {
    (!candidates.is_empty()).then_some(candidates)
}

fn collect(
    containers: &[ElementRef],
    kind: EntryKind,
    metric_of: impl Fn(ElementRef, Metric) -> Option<u32>,
) -> Vec<Candidate> {
    containers
        .iter()
        .enumerate()
        .filter_map(|(position, &container)| {
            let title = first_match(container, title_markers()).map(element_text);
            let artist = artist(container, title.as_deref());
            if title.is_none() && artist.is_none() {
                debug!("Skipping container #{position} without title and artist.");
                return None;
            }
            Some(Candidate {
                position,
                rank: rank(container),
                title,
                artist,
                last_week_rank: metric_of(container, Metric::LastWeek),
                peak_rank: metric_of(container, Metric::Peak),
                weeks_on_chart: metric_of(container, Metric::Weeks),
                cover_image_url: kind
                    .has_cover_art()
                    .then(|| container.select(selector!("img")).find_map(image_source))
                    .flatten(),
            })
        })
        .collect()
}

fn title_markers() -> &'static [Selector] {
    selectors!(
        "h3#title-of-a-story",
        "span.chart-element__information__song",
        "h3",
    )
}

fn first_match<'a>(container: ElementRef<'a>, markers: &[Selector]) -> Option<ElementRef<'a>> {
    markers
        .iter()
        .find_map(|marker| container.select(marker).find(|e| !element_text(*e).is_empty()))
}

fn rank(container: ElementRef) -> Option<u32> {
    let digits = |text: &str| {
        regex!(r"\d+")
            .find(text)
            .and_then(|m| metric::normalize(m.as_str()))
    };
    if let Some(rank) = container
        .select(selector!("[data-rank]"))
        .next()
        .and_then(|e| e.attr("data-rank"))
        .and_then(digits)
    {
        return Some(rank);
    }
    first_match(
        container,
        selectors!(
            "span.c-label.a-font-primary-bold-l",
            "span.chart-element__rank__number",
        ),
    )
    .or_else(|| {
        container
            .select(selector!("span.c-label"))
            .find(|e| regex!(r"\d").is_match(&element_text(*e)))
    })
    .and_then(|e| digits(&element_text(e)))
}

fn artist(container: ElementRef, title: Option<&str>) -> Option<String> {
    let artist = first_match(
        container,
        selectors!(
            "span.c-label.a-no-trucate",
            "span.c-label.a-font-primary-s",
            "span.chart-element__information__artist",
        ),
    )
    .map(element_text);
    artist.or_else(|| {
        container
            .select(selector!("span.c-label"))
            .map(element_text)
            .find(|text| {
                !text.is_empty()
                    && metric::normalize(text).is_none()
                    && !metric::is_no_value(text)
                    && !is_metric_label(text)
                    && Some(text.as_str()) != title
            })
    })
}

/// The first numeric element after the metric's label, within `container`.
///
/// Another metric label or an explicit no-value token ends the search, so a
/// missing value never borrows the next metric's number.
fn labeled_metric(container: ElementRef, metric: Metric) -> Option<u32> {
    let elements = container.descendants().filter_map(ElementRef::wrap).collect_vec();
    let (index, label) = elements
        .iter()
        .find_position(|e| metric.is_label(&element_text(**e)))?;
    for element in &elements[index + 1..] {
        if element.ancestors().any(|a| a == **label) {
            continue;
        }
        let text = element_text(*element);
        if text.is_empty() {
            continue;
        }
        if is_metric_label(&text) || metric::is_no_value(&text) {
            return None;
        }
        if let Some(value) = metric::normalize(&text.replace('-', "")) {
            return Some(value);
        }
    }
    None
}
