//! Fetch port - 1 件の天気取得
//!
//! 本番実装（OpenWeather + reqwest）は squall-server 側にあります。
//! ここでは trait と、テスト・デモ用の StubFetcher だけを持ちます。
//!
//! # 契約
//! - 呼び出し 1 回につきリモート呼び出しは 1 回（リトライなし）
//! - 自前の timeout を持ち、無限には待たない
//! - 失敗は Err で返すが、呼び出し側はそれも「終端した結果」として 1 回 publish する

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::domain::{Location, WeatherRecord};
use crate::error::FetchError;

/// Looks up the current weather for one location.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, location: &Location) -> Result<WeatherRecord, FetchError>;
}

/// In-memory fetcher with scripted answers.
///
/// Unknown locations answer like the provider does for an unknown city (404).
/// Locations marked as panicking blow up inside the worker, which is how the
/// guaranteed-publish path gets exercised.
#[derive(Debug, Default)]
pub struct StubFetcher {
    records: HashMap<Location, WeatherRecord>,
    failing: HashSet<Location>,
    panicking: HashSet<Location>,
    /// Random per-call latency in milliseconds, inclusive.
    jitter_ms: Option<(u64, u64)>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, location: impl Into<Location>, record: WeatherRecord) -> Self {
        self.records.insert(location.into(), record);
        self
    }

    pub fn failing(mut self, location: impl Into<Location>) -> Self {
        self.failing.insert(location.into());
        self
    }

    pub fn panicking(mut self, location: impl Into<Location>) -> Self {
        self.panicking.insert(location.into());
        self
    }

    pub fn with_jitter(mut self, min: Duration, max: Duration) -> Self {
        let min = min.as_millis() as u64;
        let max = (max.as_millis() as u64).max(min);
        self.jitter_ms = Some((min, max));
        self
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, location: &Location) -> Result<WeatherRecord, FetchError> {
        if let Some((min, max)) = self.jitter_ms {
            let delay = {
                let mut rng = rand::thread_rng();
                rng.gen_range(min..=max)
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.panicking.contains(location) {
            panic!("injected fault while fetching {location}");
        }

        if self.failing.contains(location) {
            return Err(FetchError::Transport {
                location: location.to_string(),
                message: "injected failure".to_string(),
            });
        }

        self.records
            .get(location)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                location: location.to_string(),
                status: 404,
            })
    }
}
