//! AggregationQueue - バッチ単位の結果キュー
//!
//! # 設計
//! - 中身は `RwLock<VecDeque<TaskOutcome>>`。書き込み (append / remove_head) は排他、
//!   読み取り (len / snapshot) は共有ロック
//! - append のたびに `Notify` を鳴らす。sleep-poll の代わりに `wait_for_len` で待つ
//! - バッチごとに新しく作り、バッチ終了で捨てる（リクエスト間で共有しない）
//! - ロックを持ったまま await しない。ネットワーク呼び出しを跨いで持つこともない

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Notify;

use crate::domain::TaskOutcome;

/// Ordered, shared collection of the outcomes published so far in one batch.
#[derive(Debug, Default)]
pub struct AggregationQueue {
    items: RwLock<VecDeque<TaskOutcome>>,
    appended: Notify,
}

impl AggregationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: RwLock::new(VecDeque::with_capacity(capacity)),
            appended: Notify::new(),
        }
    }

    // A worker that panicked while holding the lock cannot leave the deque
    // half-written (push/pop are not interruptible), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, VecDeque<TaskOutcome>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<TaskOutcome>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append to the tail.
    pub fn append(&self, item: TaskOutcome) {
        self.append_then(item, || {});
    }

    /// Append to the tail and run `on_commit` before the write lock is released.
    ///
    /// Anything that describes "an item is now present" (availability permits,
    /// counters) must be updated here, in the same critical section as the push.
    pub fn append_then<F: FnOnce()>(&self, item: TaskOutcome, on_commit: F) {
        {
            let mut items = self.write();
            items.push_back(item);
            on_commit();
        }
        self.appended.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of everything currently present. Never mutates.
    pub fn snapshot(&self) -> Vec<TaskOutcome> {
        self.read().iter().cloned().collect()
    }

    /// Remove and return the head, if any.
    pub fn remove_head(&self) -> Option<TaskOutcome> {
        self.write().pop_front()
    }

    /// Wait until at least `n` items have been appended.
    ///
    /// The waiter is registered before the length is checked, so an append
    /// landing between the check and the await still wakes us.
    pub async fn wait_for_len(&self, n: usize) {
        loop {
            let notified = self.appended.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.len() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{WeatherRecord, WeatherTask};
    use std::sync::Arc;
    use std::time::Duration;

    fn outcome(city: &str) -> TaskOutcome {
        let task = WeatherTask::new(city.into());
        TaskOutcome::success(&task, WeatherRecord::new(city, "XX", 1.0, "clear"))
    }

    #[test]
    fn append_keeps_order() {
        let queue = AggregationQueue::new();
        queue.append(outcome("A"));
        queue.append(outcome("B"));

        let cities: Vec<_> = queue.snapshot().into_iter().map(|o| o.record.city).collect();
        assert_eq!(cities, vec!["A", "B"]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let queue = AggregationQueue::new();
        queue.append(outcome("A"));

        let first = queue.snapshot();
        let second = queue.snapshot();
        assert_eq!(first, second);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn remove_head_is_fifo_and_empty_safe() {
        let queue = AggregationQueue::new();
        assert!(queue.remove_head().is_none());

        queue.append(outcome("A"));
        queue.append(outcome("B"));
        assert_eq!(queue.remove_head().unwrap().record.city, "A");
        assert_eq!(queue.remove_head().unwrap().record.city, "B");
        assert!(queue.is_empty());
    }

    #[test]
    fn on_commit_runs_inside_append() {
        let queue = AggregationQueue::new();
        let mut seen = 0;
        queue.append_then(outcome("A"), || seen = 1);
        assert_eq!(seen, 1);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn wait_for_len_returns_immediately_when_satisfied() {
        let queue = AggregationQueue::new();
        tokio::time::timeout(Duration::from_millis(100), queue.wait_for_len(0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wait_for_len_wakes_on_append() {
        let queue = Arc::new(AggregationQueue::new());

        let waiter = tokio::spawn({
            let queue = queue.clone();
            async move { queue.wait_for_len(3).await }
        });

        for city in ["A", "B", "C"] {
            tokio::time::sleep(Duration::from_millis(10)).await;
            queue.append(outcome(city));
        }

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn snapshot_prefix_only_grows_under_concurrent_appends() {
        let queue = Arc::new(AggregationQueue::new());

        let writer = tokio::spawn({
            let queue = queue.clone();
            async move {
                for i in 0..200 {
                    queue.append(outcome(&format!("C{i}")));
                    tokio::task::yield_now().await;
                }
            }
        });

        let mut previous: Vec<TaskOutcome> = Vec::new();
        while !writer.is_finished() {
            let current = queue.snapshot();
            assert!(current.len() >= previous.len());
            assert_eq!(&current[..previous.len()], &previous[..]);
            previous = current;
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
        assert_eq!(queue.len(), 200);
    }
}
