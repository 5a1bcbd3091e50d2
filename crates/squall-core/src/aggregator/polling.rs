//! Strategy C: wait on the queue length reaching n, then snapshot once.
//!
//! Same result as the barrier strategy, but the condition is the queue itself
//! rather than a separate completion counter. The wait is a `Notify`-driven
//! blocking wait instead of a sleep loop.

use async_trait::async_trait;

use super::{Aggregator, Strategy};
use crate::domain::TaskOutcome;
use crate::error::AggregateError;
use crate::queue::AggregationQueue;

#[derive(Debug)]
pub struct PollingAggregator {
    queue: AggregationQueue,
}

impl PollingAggregator {
    pub fn new(expected: usize) -> Self {
        Self {
            queue: AggregationQueue::with_capacity(expected),
        }
    }
}

#[async_trait]
impl Aggregator for PollingAggregator {
    fn strategy(&self) -> Strategy {
        Strategy::Polling
    }

    fn publish(&self, outcome: TaskOutcome) {
        self.queue.append(outcome);
    }

    async fn gather_all(&self, n: usize) -> Result<Vec<TaskOutcome>, AggregateError> {
        self.queue.wait_for_len(n).await;
        Ok(self.queue.snapshot())
    }
}
