//! OpenWeather implementation of the fetch port.
//!
//! One GET per lookup, bounded by the client timeout, no retries. The API key
//! lives in a file and is read once per process.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

use squall_core::{FetchError, Fetcher, Location, WeatherRecord};

use crate::config::{Config, Units};

/// File-backed API key, cached after the first successful read.
#[derive(Debug)]
pub struct ApiKeySource {
    path: PathBuf,
    cached: OnceCell<String>,
}

impl ApiKeySource {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: OnceCell::new(),
        }
    }

    /// A key known up front; the file is never touched.
    pub fn fixed(key: impl Into<String>) -> Self {
        Self {
            path: PathBuf::new(),
            cached: OnceCell::new_with(Some(key.into())),
        }
    }

    pub async fn get(&self) -> Result<&str, FetchError> {
        self.cached
            .get_or_try_init(|| async {
                let raw = tokio::fs::read_to_string(&self.path)
                    .await
                    .map_err(|e| FetchError::Credential(format!("{}: {e}", self.path.display())))?;
                let key = raw.trim();
                if key.is_empty() {
                    return Err(FetchError::Credential(format!("{} is empty", self.path.display())));
                }
                Ok(key.to_string())
            })
            .await
            .map(String::as_str)
    }
}

// Only the fields the record needs; the provider sends many more.
#[derive(Debug, Deserialize)]
struct CurrentWeather {
    name: String,
    #[serde(default)]
    sys: Sys,
    main: MainReadings,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Default, Deserialize)]
struct Sys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

impl CurrentWeather {
    fn into_record(self, location: &Location) -> Result<WeatherRecord, FetchError> {
        let condition = self.weather.into_iter().next().ok_or_else(|| FetchError::Decode {
            location: location.to_string(),
            message: "response has no weather conditions".to_string(),
        })?;
        Ok(WeatherRecord::new(
            self.name,
            self.sys.country,
            self.main.temp,
            condition.description,
        ))
    }
}

pub struct OpenWeatherFetcher {
    client: reqwest::Client,
    base_url: String,
    units: Units,
    api_key: ApiKeySource,
}

impl OpenWeatherFetcher {
    pub fn new(
        base_url: impl Into<String>,
        units: Units,
        api_key: ApiKeySource,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            units,
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.provider_url.clone(),
            config.units,
            ApiKeySource::from_file(&config.api_key_file),
            config.fetch_timeout(),
        )
    }
}

#[async_trait]
impl Fetcher for OpenWeatherFetcher {
    async fn fetch(&self, location: &Location) -> Result<WeatherRecord, FetchError> {
        let key = self.api_key.get().await?;
        let url = format!("{}/data/2.5/weather", self.base_url);

        // The key is a query parameter; never log the full URL.
        debug!(%location, units = self.units.as_str(), "requesting current weather");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", location.as_str()),
                ("appid", key),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                location: location.to_string(),
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }

        let body: CurrentWeather = response.json().await.map_err(|e| FetchError::Decode {
            location: location.to_string(),
            message: e.without_url().to_string(),
        })?;
        body.into_record(location)
    }
}
