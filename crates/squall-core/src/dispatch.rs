//! Dispatcher - 1 バッチ分の scatter-gather
//!
//! # フロー
//! 1. location ごとに WeatherTask を作り、1 Task = 1 worker で tokio::spawn（上限なし）
//! 2. worker は Fetcher を 1 回呼び、失敗なら sentinel に置き換える（エラーは上に返さない）
//! 3. worker は PublishTicket を消費して publish をちょうど 1 回行う
//! 4. collector は `gather_all(n)` で n 件集める
//!
//! worker はデタッチされています。HTTP 側が切断しても取得は最後まで走り、結果は捨てられます。

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{Instrument, error, info, info_span, warn};

use crate::aggregator::{Aggregator, Strategy};
use crate::domain::{BatchId, Location, TaskOutcome, WeatherRecord, WeatherTask};
use crate::error::AggregateError;
use crate::fetch::Fetcher;

/// Failure text published for a worker that ended without publishing.
pub const UNPUBLISHED: &str = "worker exited without publishing";

/// The obligation to publish exactly one outcome for one task.
///
/// `publish` consumes the ticket. A ticket dropped unused (early return,
/// panic unwinding) publishes the failure sentinel instead, so the collector
/// always receives one outcome per task.
pub struct PublishTicket {
    task: WeatherTask,
    aggregator: Option<Arc<dyn Aggregator>>,
}

impl PublishTicket {
    pub fn new(task: WeatherTask, aggregator: Arc<dyn Aggregator>) -> Self {
        Self {
            task,
            aggregator: Some(aggregator),
        }
    }

    pub fn task(&self) -> &WeatherTask {
        &self.task
    }

    pub fn publish(mut self, outcome: TaskOutcome) {
        if let Some(aggregator) = self.aggregator.take() {
            aggregator.publish(outcome);
        }
    }
}

impl Drop for PublishTicket {
    fn drop(&mut self) {
        if let Some(aggregator) = self.aggregator.take() {
            error!(
                task_id = %self.task.task_id(),
                location = %self.task.location(),
                panicking = std::thread::panicking(),
                "{UNPUBLISHED}; publishing sentinel"
            );
            aggregator.publish(TaskOutcome::failure(&self.task, UNPUBLISHED));
        }
    }
}

/// Result of one dispatched batch.
#[derive(Debug, Clone)]
pub struct Batch {
    pub batch_id: BatchId,
    pub strategy: Strategy,
    pub outcomes: Vec<TaskOutcome>,
    pub elapsed: Duration,
}

impl Batch {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn records(&self) -> impl Iterator<Item = &WeatherRecord> {
        self.outcomes.iter().map(|o| &o.record)
    }
}

/// Starts one worker per location and gathers their outcomes.
#[derive(Clone)]
pub struct Dispatcher {
    fetcher: Arc<dyn Fetcher>,
}

impl Dispatcher {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn dispatch(
        &self,
        strategy: Strategy,
        locations: Vec<Location>,
    ) -> Result<Batch, AggregateError> {
        let batch_id = BatchId::generate();
        let started = Instant::now();
        let n = locations.len();

        // Batch-scoped: nothing here outlives this call except detached workers
        // holding their own Arc.
        let aggregator = strategy.build(n);

        for location in locations {
            let task = WeatherTask::new(location);
            let span = info_span!("worker", %batch_id, task_id = %task.task_id(), location = %task.location());
            let ticket = PublishTicket::new(task, Arc::clone(&aggregator));
            tokio::spawn(run_worker(Arc::clone(&self.fetcher), ticket).instrument(span));
        }

        let outcomes = aggregator.gather_all(n).await.inspect_err(|err| {
            error!(%batch_id, %strategy, tasks = n, error = %err, "gather failed");
        })?;

        let batch = Batch {
            batch_id,
            strategy,
            outcomes,
            elapsed: started.elapsed(),
        };
        info!(
            %batch_id,
            %strategy,
            tasks = n,
            failures = batch.failures(),
            elapsed_ms = batch.elapsed.as_millis() as u64,
            "batch gathered"
        );
        Ok(batch)
    }
}

async fn run_worker(fetcher: Arc<dyn Fetcher>, ticket: PublishTicket) {
    let location = ticket.task().location().clone();
    let outcome = match fetcher.fetch(&location).await {
        Ok(record) => TaskOutcome::success(ticket.task(), record),
        Err(err) => {
            warn!(error = %err, "weather fetch failed; publishing sentinel");
            TaskOutcome::failure(ticket.task(), err.to_string())
        }
    };
    ticket.publish(outcome);
}
