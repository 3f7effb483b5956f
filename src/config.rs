use std::{fmt, time::Duration};

use derive_more::{AsRef, From};
use typed_builder::TypedBuilder;
use url::Url;

pub const STORE_URL_VAR: &str = "SUPABASE_URL";
pub const SERVICE_KEY_VAR: &str = "SUPABASE_SERVICE_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is not set.")]
    Missing(&'static str),
    #[error("SUPABASE_URL is not a valid URL: {value:?}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Clone, PartialEq, Eq, From, AsRef)]
#[as_ref(forward)]
pub struct ServiceKey(String);

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServiceKey(<redacted>)")
    }
}

#[derive(Clone, Debug, TypedBuilder)]
pub struct Config {
    pub store_url: Url,
    #[builder(setter(into))]
    pub service_key: ServiceKey,
    #[builder(default = Duration::from_secs(30))]
    pub fetch_timeout: Duration,
    #[builder(default = Duration::from_secs(20))]
    pub delete_timeout: Duration,
    #[builder(default = Duration::from_secs(30))]
    pub write_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let value = read(STORE_URL_VAR)?;
        let store_url = Url::parse(&value).map_err(|source| ConfigError::InvalidUrl {
            value: value.clone(),
            source,
        })?;
        Ok(Config::builder()
            .store_url(store_url)
            .service_key(read(SERVICE_KEY_VAR)?)
            .build())
    }
}
