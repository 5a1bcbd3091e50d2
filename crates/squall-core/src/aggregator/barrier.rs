//! Strategy A: wait for every worker, then snapshot once.
//!
//! Latency is that of the slowest worker; a hung worker stalls the batch until
//! the fetcher's own timeout fires. Order is completion order.

use async_trait::async_trait;
use tracing::warn;

use super::{Aggregator, Strategy};
use crate::domain::TaskOutcome;
use crate::error::AggregateError;
use crate::queue::{AggregationQueue, WaitGroup};

#[derive(Debug)]
pub struct BarrierAggregator {
    queue: AggregationQueue,
    workers: WaitGroup,
}

impl BarrierAggregator {
    pub fn new(expected: usize) -> Self {
        Self {
            queue: AggregationQueue::with_capacity(expected),
            workers: WaitGroup::new(expected),
        }
    }
}

#[async_trait]
impl Aggregator for BarrierAggregator {
    fn strategy(&self) -> Strategy {
        Strategy::Barrier
    }

    fn publish(&self, outcome: TaskOutcome) {
        let task_id = outcome.task_id;
        self.queue.append(outcome);
        if !self.workers.done() {
            warn!(%task_id, "publish after barrier release; outcome kept but not waited for");
        }
    }

    async fn gather_all(&self, n: usize) -> Result<Vec<TaskOutcome>, AggregateError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        self.workers.wait().await;
        Ok(self.queue.snapshot())
    }
}
