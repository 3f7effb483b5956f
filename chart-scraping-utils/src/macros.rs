/// Compiles a CSS selector once and hands out a `&'static Selector`.
#[macro_export]
macro_rules! selector {
    ($e: expr) => {{
        use ::once_cell::sync::Lazy;
        use ::scraper::Selector;
        static SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse($e).unwrap());
        &*SELECTOR
    }};
}

/// Ordered fallback list of selectors, compiled once, as `&'static [Selector]`.
#[macro_export]
macro_rules! selectors {
    ($($e: expr),+ $(,)?) => {{
        use ::once_cell::sync::Lazy;
        use ::scraper::Selector;
        static SELECTORS: Lazy<Vec<Selector>> =
            Lazy::new(|| vec![$(Selector::parse($e).unwrap()),+]);
        SELECTORS.as_slice()
    }};
}

#[macro_export]
macro_rules! regex {
    ($e: expr) => {{
        use ::once_cell::sync::Lazy;
        use ::regex::Regex;
        static PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new($e).unwrap());
        &*PATTERN
    }};
}
