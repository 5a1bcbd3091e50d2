//! Strategy B: fan-in through one bounded channel sized to the batch.
//!
//! The collector starts consuming as soon as the first worker finishes. With
//! capacity n and exactly n publishes, `try_send` never sees a full channel;
//! if it ever does (a duplicate publish), the send is moved to a task so the
//! publisher still never blocks.

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error};

use super::{Aggregator, Strategy};
use crate::domain::TaskOutcome;
use crate::error::AggregateError;

#[derive(Debug)]
pub struct ChannelAggregator {
    tx: mpsc::Sender<TaskOutcome>,
    rx: Mutex<mpsc::Receiver<TaskOutcome>>,
}

impl ChannelAggregator {
    pub fn new(expected: usize) -> Self {
        let (tx, rx) = mpsc::channel(expected.max(1));
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }
}

#[async_trait]
impl Aggregator for ChannelAggregator {
    fn strategy(&self) -> Strategy {
        Strategy::Channel
    }

    fn publish(&self, outcome: TaskOutcome) {
        match self.tx.try_send(outcome) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(outcome)) => {
                error!(task_id = %outcome.task_id, "result channel full; more publishes than tasks");
                let tx = self.tx.clone();
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            let _ = tx.send(outcome).await;
                        });
                    }
                    Err(_) => error!("no runtime to park overflow outcome; dropped"),
                }
            }
            Err(mpsc::error::TrySendError::Closed(outcome)) => {
                debug!(task_id = %outcome.task_id, "collector gone; outcome discarded");
            }
        }
    }

    async fn gather_all(&self, n: usize) -> Result<Vec<TaskOutcome>, AggregateError> {
        let mut rx = self.rx.lock().await;
        let mut gathered = Vec::with_capacity(n);
        while gathered.len() < n {
            match rx.recv().await {
                Some(outcome) => gathered.push(outcome),
                None => {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{WeatherRecord, WeatherTask};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn consumes_in_receive_order() {
        let aggregator = ChannelAggregator::new(3);
        let tasks: Vec<_> = ["A", "B", "C"]
            .into_iter()
            .map(|c| WeatherTask::new(c.into()))
            .collect();

        for task in tasks.iter().rev() {
            aggregator.publish(TaskOutcome::success(task, WeatherRecord::new(task.location().as_str(), "XX", 0.5, "ok")));
        }

        let gathered = aggregator.gather_all(3).await.unwrap();
        let cities: Vec<_> = gathered.iter().map(|o| o.record.city.as_str()).collect();
        assert_eq!(cities, vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn collector_drains_while_workers_are_still_running() {
        let aggregator = Arc::new(ChannelAggregator::new(2));
        aggregator.publish(TaskOutcome::failure(&WeatherTask::new("fast".into()), "x"));

        let collector = tokio::spawn({
            let aggregator = aggregator.clone();
            async move { aggregator.gather_all(2).await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!collector.is_finished());
        assert!(aggregator.rx.try_lock().is_err(), "collector should be parked on recv");

        aggregator.publish(TaskOutcome::failure(&WeatherTask::new("slow".into()), "y"));
        let gathered = collector.await.unwrap().unwrap();
        assert_eq!(gathered.len(), 2);
    }

    #[tokio::test]
    async fn overflow_publish_is_not_lost() {
        let aggregator = ChannelAggregator::new(1);
        aggregator.publish(TaskOutcome::failure(&WeatherTask::new("A".into()), "x"));
        aggregator.publish(TaskOutcome::failure(&WeatherTask::new("B".into()), "y"));

        let gathered = tokio::time::timeout(Duration::from_secs(1), aggregator.gather_all(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(gathered.len(), 2);
    }
}
