//! Strategy D: single-item hand-off drained while producers are still running.
//!
//! # 状態遷移（1 件ごと）
//! ```text
//! Empty --append--> Has-Available --claim--> Claimed --remove--> Empty
//! ```
//! - 「可用」フラグは counting semaphore に置き換えています。permit 1 つ = 未確保の item 1 件
//! - permit は append と同じ write ロック区間の中で追加する（ロック外で立てると
//!   「item はあるのに permit がない」瞬間ができ、consumer が取りこぼす）
//! - consumer は permit を 1 つ取得して forget した時点で Claimed。permit は 1 人にしか渡らないので
//!   同じ item を 2 人が取ることはない（at-most-once）
//! - 常に `permits <= len` が成り立つので、Claimed の consumer が remove_head したとき空はありえない
//!
//! # 生存性
//! consumer はちょうど n 個。どれか 1 つの Task が publish せずに終わると、対応する consumer は
//! 永遠に permit を待つ。これを防ぐのは dispatcher の PublishTicket（Drop で sentinel を publish）です。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::error;

use super::{Aggregator, Strategy};
use crate::domain::TaskOutcome;
use crate::error::AggregateError;
use crate::queue::AggregationQueue;

/// Capacity of the channel between the yield consumers and the collector.
const RENDEZVOUS_CAPACITY: usize = 2;

#[derive(Debug, Clone)]
pub struct HandoffAggregator {
    queue: Arc<AggregationQueue>,
    available: Arc<Semaphore>,
}

impl HandoffAggregator {
    pub fn new(expected: usize) -> Self {
        Self {
            queue: Arc::new(AggregationQueue::with_capacity(expected)),
            available: Arc::new(Semaphore::new(0)),
        }
    }

    /// Items published but not yet claimed.
    pub fn available(&self) -> usize {
        self.available.available_permits()
    }

    /// Items still sitting in the queue (available or claimed-but-not-removed).
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Wait for an available item, claim it and remove it.
    pub async fn pop(&self) -> Result<TaskOutcome, AggregateError> {
        let permit = self
            .available
            .acquire()
            .await
            .map_err(|_| AggregateError::Consumer("availability semaphore closed".to_string()))?;
        permit.forget();

        self.queue.remove_head().ok_or_else(|| {
            error!("claimed a permit with an empty queue");
            AggregateError::ClaimWithoutItem
        })
    }
}

#[async_trait]
impl Aggregator for HandoffAggregator {
    fn strategy(&self) -> Strategy {
        Strategy::Handoff
    }

    fn publish(&self, outcome: TaskOutcome) {
        let available = &self.available;
        self.queue.append_then(outcome, || available.add_permits(1));
    }

    async fn gather_all(&self, n: usize) -> Result<Vec<TaskOutcome>, AggregateError> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let (tx, mut rx) = mpsc::channel(RENDEZVOUS_CAPACITY);

        // Dropped on every return path below, which aborts consumers still waiting.
        let mut consumers = JoinSet::new();
        for _ in 0..n {
            let this = self.clone();
            let tx = tx.clone();
            consumers.spawn(async move {
                let popped = this.pop().await;
                // Only fails when the collector already returned.
                let _ = tx.send(popped).await;
            });
        }
        drop(tx);

        let mut gathered = Vec::with_capacity(n);
        while gathered.len() < n {
            match rx.recv().await {
                Some(Ok(outcome)) => gathered.push(outcome),
                Some(Err(err)) => return Err(err),
                None => {
                    while let Some(joined) = consumers.join_next().await {
                        if let Err(err) = joined {
                            return Err(AggregateError::Consumer(err.to_string()));
                        }
                    }
                    return Err(AggregateError::ChannelClosed {
                        received: gathered.len(),
                        expected: n,
                    });
                }
            }
        }
        Ok(gathered)
    }
}
