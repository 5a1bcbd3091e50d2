//! WaitGroup - 全 worker の完了を待つバリア
//!
//! 参加者数 n で作り、各 worker が `done()` を 1 回呼ぶ。
//! `wait()` は残りが 0 になるまで待つ。

use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

/// Completion barrier: releases once every participant has arrived.
#[derive(Debug)]
pub struct WaitGroup {
    pending: Mutex<usize>,
    released: Notify,
}

impl WaitGroup {
    pub fn new(participants: usize) -> Self {
        Self {
            pending: Mutex::new(participants),
            released: Notify::new(),
        }
    }

    /// Number of participants that have not arrived yet.
    pub fn pending(&self) -> usize {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark one participant as finished.
    ///
    /// Extra calls past zero are ignored; they are logged by the caller.
    pub fn done(&self) -> bool {
        let released = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if *pending == 0 {
                return false;
            }
            *pending -= 1;
            *pending == 0
        };
        if released {
            self.released.notify_waiters();
        }
        true
    }

    pub async fn wait(&self) {
        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}
