//! squall-core
//!
//! 複数 location の天気をまとめて取りに行く scatter-gather の中核。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, Location / WeatherTask, WeatherRecord / TaskOutcome）
//! - **fetch**: 1 件取得の port（Fetcher trait）とテスト用 StubFetcher
//! - **queue**: バッチ単位の AggregationQueue と WaitGroup
//! - **aggregator**: publish / gather プロトコル 4 種（barrier, channel, polling, handoff）
//! - **dispatch**: 1 Task = 1 worker の起動と PublishTicket による publish 保証
//! - **error**: FetchError / AggregateError

pub mod aggregator;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod queue;

pub use aggregator::{Aggregator, Strategy, UnknownStrategy};
pub use dispatch::{Batch, Dispatcher, PublishTicket};
pub use domain::{BatchId, Location, TaskId, TaskOutcome, WeatherRecord, WeatherTask};
pub use error::{AggregateError, FetchError};
pub use fetch::{Fetcher, StubFetcher};
