use chart_scraping_utils::selector;
use itertools::Itertools;
use scraper::{ElementRef, Html};

const IGNORED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// A piece of the page in document order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    /// One trimmed, non-empty line of text outside any hyperlink.
    Text(String),
    Link(Link),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Link {
    /// Whitespace-collapsed text of the whole anchor; may be empty.
    pub text: String,
    /// Source of the first image inside the anchor, if it wraps one.
    pub image: Option<String>,
}

impl Link {
    /// A hyperlink carrying readable text and no image.
    pub fn is_textual(&self) -> bool {
        self.image.is_none() && !self.text.is_empty()
    }
}

/// Flattens the document into text lines and hyperlinks in document order.
pub fn tokenize(html: &Html) -> Vec<Token> {
    let mut tokens = vec![];
    walk(html.root_element(), &mut tokens);
    tokens
}

/// All the readable lines of the page, hyperlink texts included, joined by `\n`.
pub fn flatten(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter_map(|token| match token {
            Token::Text(line) => Some(line.as_str()),
            Token::Link(link) => (!link.text.is_empty()).then_some(link.text.as_str()),
        })
        .join("\n")
}

fn walk(element: ElementRef, tokens: &mut Vec<Token>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            tokens.extend(lines(text).map(|line| Token::Text(line.replace('\u{a0}', " "))));
        } else if let Some(child) = ElementRef::wrap(child) {
            match child.value().name() {
                name if IGNORED_ELEMENTS.contains(&name) => {}
                "a" => tokens.push(Token::Link(Link {
                    text: element_text(child),
                    image: child.select(selector!("img")).next().and_then(image_source),
                })),
                _ => walk(child, tokens),
            }
        }
    }
}

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Text of an element with runs of whitespace collapsed to one space.
pub fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(|text| text.split(char::is_whitespace))
        .filter(|word| !word.is_empty())
        .join(" ")
}

/// Lazy-loading attributes win over `src`, which is often a placeholder then.
pub fn image_source(img: ElementRef) -> Option<String> {
    ["data-lazy-img", "data-src", "src"]
        .into_iter()
        .find_map(|attr| img.attr(attr).map(str::trim).filter(|src| !src.is_empty()))
        .map(str::to_owned)
}
