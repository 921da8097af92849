use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinSet};

use crate::ports::RepositoryResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Keeps handles to fire-and-forget remote calls. Failures are logged and
/// counted; nothing is retried and nothing is rolled back.
#[derive(Default)]
pub struct SyncTracker {
    in_flight: Mutex<JoinSet<bool>>,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl SyncTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `call` in the background and returns without waiting for it.
    pub async fn spawn<F>(&self, operation: &'static str, call: F)
    where
        F: Future<Output = RepositoryResult<()>> + Send + 'static,
    {
        let mut in_flight = self.in_flight.lock().await;
        while let Some(result) = in_flight.try_join_next() {
            self.record(result);
        }
        in_flight.spawn(async move {
            match call.await {
                Ok(()) => {
                    tracing::debug!(operation, "Background sync completed");
                    true
                }
                Err(e) => {
                    tracing::error!(operation, error = %e, "Background sync failed");
                    false
                }
            }
        });
    }

    pub async fn pending(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    /// Waits for every call started so far and returns the running totals.
    pub async fn flush(&self) -> SyncSummary {
        let mut in_flight = self.in_flight.lock().await;
        while let Some(result) = in_flight.join_next().await {
            self.record(result);
        }
        self.summary()
    }

    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    fn record(&self, result: Result<bool, JoinError>) {
        match result {
            Ok(true) => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Ok(false) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!(error = %e, "Background sync task aborted");
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
