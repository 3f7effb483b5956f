use std::time::Duration;

use chrono::NaiveDate;
use log::debug;
use reqwest::Request;
use url::Url;

use super::{ChartStore, StoreError};
use crate::{
    config::{Config, ServiceKey},
    schema::{ChartEntry, WriteMode},
};

const CONFLICT_TARGET: &str = "chart_date,rank";

/// PostgREST flavoured store, as exposed by Supabase under `/rest/v1`.
pub struct RestStore {
    reqwest: reqwest::Client,
    base: Url,
    service_key: ServiceKey,
    delete_timeout: Duration,
    write_timeout: Duration,
}

impl RestStore {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        if config.store_url.cannot_be_a_base() {
            return Err(StoreError::InvalidBaseUrl(config.store_url.clone()));
        }
        Ok(Self {
            reqwest: reqwest::Client::builder().build()?,
            base: config.store_url.clone(),
            service_key: config.service_key.clone(),
            delete_timeout: config.delete_timeout,
            write_timeout: config.write_timeout,
        })
    }

    fn endpoint(&self, collection: &str) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidBaseUrl(self.base.clone()))?
            .pop_if_empty()
            .extend(["rest", "v1", collection]);
        Ok(url)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key: &str = self.service_key.as_ref();
        builder.header("apikey", key).bearer_auth(key)
    }

    fn delete_request(&self, collection: &str, date: NaiveDate) -> Result<Request, StoreError> {
        let builder = self
            .reqwest
            .delete(self.endpoint(collection)?)
            .query(&[("chart_date", format!("eq.{date}"))])
            .timeout(self.delete_timeout);
        Ok(self.authorized(builder).build()?)
    }

    fn write_request(
        &self,
        collection: &str,
        entries: &[ChartEntry],
        mode: WriteMode,
    ) -> Result<Request, StoreError> {
        let mut builder = self
            .reqwest
            .post(self.endpoint(collection)?)
            .json(entries)
            .timeout(self.write_timeout);
        builder = match mode {
            WriteMode::Insert => builder.header("Prefer", "return=minimal"),
            WriteMode::Upsert => builder
                .query(&[("on_conflict", CONFLICT_TARGET)])
                .header("Prefer", "resolution=merge-duplicates,return=minimal"),
        };
        Ok(self.authorized(builder).build()?)
    }

    async fn execute(&self, request: Request) -> Result<(), StoreError> {
        debug!("{} {}", request.method(), request.url());
        let response = self.reqwest.execute(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected { status, body })
    }
}

impl ChartStore for RestStore {
    async fn delete_chart_date(&self, collection: &str, date: NaiveDate) -> Result<(), StoreError> {
        self.execute(self.delete_request(collection, date)?).await
    }

    async fn write(
        &self,
        collection: &str,
        entries: &[ChartEntry],
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        self.execute(self.write_request(collection, entries, mode)?)
            .await
    }
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base", &self.base.as_str())
            .field("service_key", &self.service_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use itertools::Itertools;
    use reqwest::{header, Method};
    use url::Url;

    use super::RestStore;
    use crate::{
        config::Config,
        schema::WriteMode,
        store::tests::{chart_date, entries},
    };

    fn store(base: &str) -> RestStore {
        let config = Config::builder()
            .store_url(Url::parse(base).unwrap())
            .service_key("k3y".to_owned())
            .build();
        RestStore::new(&config).unwrap()
    }

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect_vec()
    }

    #[test]
    fn delete_filters_by_chart_date() {
        let request = store("https://abc.supabase.co")
            .delete_request("hot_100_entries", chart_date())
            .unwrap();
        assert_eq!(*request.method(), Method::DELETE);
        assert_eq!(request.url().path(), "/rest/v1/hot_100_entries");
        assert_eq!(
            query(request.url()),
            [("chart_date".to_owned(), "eq.2025-11-22".to_owned())]
        );
        assert_eq!(request.headers()["apikey"], "k3y");
        assert_eq!(request.headers()[header::AUTHORIZATION], "Bearer k3y");
        assert_eq!(request.timeout(), Some(&Duration::from_secs(20)));
    }

    #[test]
    fn insert_posts_a_json_array() {
        let request = store("https://abc.supabase.co/")
            .write_request("uk_singles_entries", &entries(2), WriteMode::Insert)
            .unwrap();
        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.url().query(), None);
        assert_eq!(request.headers()["Prefer"], "return=minimal");
        assert_eq!(request.timeout(), Some(&Duration::from_secs(30)));
        let body: serde_json::Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[1]["rank"], 2);
        assert_eq!(body[0]["chart_date"], "2025-11-22");
    }

    #[test]
    fn upsert_targets_date_and_rank() {
        let request = store("https://abc.supabase.co/base/")
            .write_request("billboard_200_entries", &entries(1), WriteMode::Upsert)
            .unwrap();
        assert_eq!(request.url().path(), "/base/rest/v1/billboard_200_entries");
        assert_eq!(
            query(request.url()),
            [("on_conflict".to_owned(), "chart_date,rank".to_owned())]
        );
        assert!(request.headers()["Prefer"]
            .to_str()
            .unwrap()
            .contains("resolution=merge-duplicates"));
    }

    #[test]
    fn key_is_not_logged() {
        assert!(!format!("{:?}", store("https://abc.supabase.co")).contains("k3y"));
    }
}
