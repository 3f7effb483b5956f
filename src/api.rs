use std::time::Duration;

use log::debug;
use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to fetch {url}: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url:?} is not a valid page URL: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{url} responded with {status}")]
    Status {
        url: Url,
        status: reqwest::StatusCode,
    },
}

pub fn page_url(raw: &str) -> Result<Url, FetchError> {
    Url::parse(raw).map_err(|source| FetchError::InvalidUrl {
        url: raw.to_owned(),
        source,
    })
}

/// Anything that can hand out the markup of a chart page.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;
}

pub struct ChartClient {
    reqwest: reqwest::Client,
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE),
    );
    headers
}

impl ChartClient {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let reqwest = reqwest::Client::builder()
            .default_headers(default_headers())
            .timeout(timeout)
            .build()?;
        Ok(Self { reqwest })
    }
}

impl PageSource for ChartClient {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.clone(),
            source,
        };
        let response = self
            .reqwest
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        debug!("GET {url} -> {status}");
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status,
            });
        }
        response.text().await.map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header;
    use strum::IntoEnumIterator;

    use super::{default_headers, page_url, FetchError, ACCEPT_LANGUAGE};
    use crate::schema::ChartKind;

    #[test]
    fn browser_like_headers() {
        let headers = default_headers();
        assert!(headers[header::USER_AGENT]
            .to_str()
            .unwrap()
            .starts_with("Mozilla/5.0"));
        assert_eq!(headers[header::ACCEPT_LANGUAGE], ACCEPT_LANGUAGE);
    }

    #[test]
    fn chart_urls_parse_and_bad_ones_are_errors() {
        for chart in ChartKind::iter() {
            assert!(page_url(chart.url()).is_ok(), "{chart}");
        }
        assert!(matches!(
            page_url("charts/hot-100"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }
}
