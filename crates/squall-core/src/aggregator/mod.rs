//! Aggregator - scatter-gather の publish / gather プロトコル
//!
//! 4 つの strategy はすべて同じ契約の別実装です（差し替え可能な policy）。
//!
//! # 契約
//! - worker は Task 1 つにつき `publish` をちょうど 1 回呼ぶ（成功でも sentinel でも）
//! - collector は `gather_all(n)` で n 件を集める。数えるのは件数であって成功数ではない
//! - n = 0 は即座に空を返す
//! - aggregator はバッチごとに `Strategy::build` で新しく作る
//!
//! | strategy | publish | gather |
//! |----------|---------|--------|
//! | barrier  | append + WaitGroup::done | 全員の done を待ってから snapshot |
//! | channel  | 容量 n の mpsc に送る | n 回 recv |
//! | polling  | append | len >= n になるまで待ってから snapshot |
//! | handoff  | append + 可用 permit を 1 つ追加 | n 個の yield consumer が 1 件ずつ pop して転送 |

mod barrier;
mod channel;
mod handoff;
mod polling;

pub use barrier::BarrierAggregator;
pub use channel::ChannelAggregator;
pub use handoff::HandoffAggregator;
pub use polling::PollingAggregator;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::TaskOutcome;
use crate::error::AggregateError;

/// One publish/gather protocol over a single batch.
#[async_trait]
pub trait Aggregator: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Hand one outcome to the collector. Never blocks; callable from `Drop`.
    fn publish(&self, outcome: TaskOutcome);

    /// Collect `n` outcomes. `n` must match the count the aggregator was built for.
    async fn gather_all(&self, n: usize) -> Result<Vec<TaskOutcome>, AggregateError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Barrier,
    Channel,
    Polling,
    Handoff,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Barrier,
        Strategy::Channel,
        Strategy::Polling,
        Strategy::Handoff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Barrier => "barrier",
            Strategy::Channel => "channel",
            Strategy::Polling => "polling",
            Strategy::Handoff => "handoff",
        }
    }

    /// Fresh, batch-scoped aggregator expecting `expected` outcomes.
    pub fn build(self, expected: usize) -> Arc<dyn Aggregator> {
        match self {
            Strategy::Barrier => Arc::new(BarrierAggregator::new(expected)),
            Strategy::Channel => Arc::new(ChannelAggregator::new(expected)),
            Strategy::Polling => Arc::new(PollingAggregator::new(expected)),
            Strategy::Handoff => Arc::new(HandoffAggregator::new(expected)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown strategy '{0}' (expected barrier, channel, polling or handoff)")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    /// Accepts the strategy names and the legacy `stress0`..`stress3` endpoint names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "barrier" | "stress0" => Ok(Strategy::Barrier),
            "channel" | "stress1" => Ok(Strategy::Channel),
            "polling" | "stress2" => Ok(Strategy::Polling),
            "handoff" | "stress3" => Ok(Strategy::Handoff),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}
