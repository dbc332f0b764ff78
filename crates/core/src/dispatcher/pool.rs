//! Bounded dispatcher implementation.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error};

use super::config::{DispatcherConfig, RetryConfig};
use super::traits::ItemWorker;
use super::types::{DispatchEvent, ItemFailure, ItemReport, PoolStatus};
use crate::item::ItemId;
use crate::metrics;

/// Error type for dispatcher construction.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Pool width of zero.
    #[error("Pool width must be at least 1")]
    ZeroWidth,

    /// Pool width larger than the semaphore can represent.
    #[error("Pool width {0} exceeds the maximum of {max}", max = Semaphore::MAX_PERMITS)]
    TooWide(usize),
}

/// Tracks statistics for a pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    peak: AtomicU64,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
}

impl PoolStats {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self, success: bool) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        if success {
            self.total_processed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.total_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn to_status(&self, name: &str, max_concurrent: usize) -> PoolStatus {
        PoolStatus {
            name: name.to_string(),
            active_jobs: self.active.load(Ordering::SeqCst) as usize,
            max_concurrent,
            peak_active: self.peak.load(Ordering::SeqCst) as usize,
            total_processed: self.total_processed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
        }
    }
}

/// Fixed-width pool running one worker invocation per item.
///
/// A semaphore permit is acquired before each task is spawned and held until
/// the task ends, so at most `max_concurrency` invocations are outstanding.
/// Events are forwarded as they happen; completion order is arbitrary.
pub struct BoundedDispatcher {
    name: String,
    config: DispatcherConfig,
    semaphore: Arc<Semaphore>,
    stats: Arc<PoolStats>,
}

impl BoundedDispatcher {
    /// Creates a new pool. Fails if the configured width is unusable.
    pub fn new(name: impl Into<String>, config: DispatcherConfig) -> Result<Self, DispatchError> {
        if config.max_concurrency == 0 {
            return Err(DispatchError::ZeroWidth);
        }
        if config.max_concurrency > Semaphore::MAX_PERMITS {
            return Err(DispatchError::TooWide(config.max_concurrency));
        }

        Ok(Self {
            name: name.into(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrency)),
            stats: Arc::new(PoolStats::default()),
            config,
        })
    }

    /// Returns the pool width.
    pub fn width(&self) -> usize {
        self.config.max_concurrency
    }

    /// Returns the current pool status.
    pub fn status(&self) -> PoolStatus {
        self.stats.to_status(&self.name, self.config.max_concurrency)
    }

    /// Dispatches every item exactly once and returns the event stream.
    ///
    /// Returns immediately; the receiver yields a `Started` and a `Completed`
    /// event per item and closes once every item is terminal. Must be called
    /// from within a tokio runtime.
    pub fn dispatch<W>(&self, items: Vec<ItemId>, worker: Arc<W>) -> mpsc::Receiver<DispatchEvent>
    where
        W: ItemWorker + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::channel(self.config.event_buffer.max(1));
        let semaphore = Arc::clone(&self.semaphore);
        let stats = Arc::clone(&self.stats);
        let retry = self.config.retry.clone();
        let name = self.name.clone();

        tokio::spawn(async move {
            let mut tasks = JoinSet::new();
            debug!(pool = %name, items = items.len(), "Dispatching items");

            for item in items {
                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        error!(pool = %name, %item, "Pool closed before item could start");
                        let report = ItemReport::failed(item, "pool closed", 0, Default::default());
                        let _ = tx.send(DispatchEvent::Completed(report)).await;
                        continue;
                    }
                };

                let worker = Arc::clone(&worker);
                let stats = Arc::clone(&stats);
                let retry = retry.clone();
                let tx = tx.clone();

                tasks.spawn(async move {
                    let _permit = permit;
                    let stage = worker.stage();
                    let in_flight = metrics::ITEMS_IN_FLIGHT.with_label_values(&[stage.as_str()]);

                    stats.enter();
                    in_flight.inc();
                    let _ = tx.send(DispatchEvent::Started { item }).await;

                    let report = run_item(worker.as_ref(), item, &retry).await;

                    in_flight.dec();
                    stats.leave(report.is_success());
                    metrics::ITEMS_TOTAL
                        .with_label_values(&[
                            stage.as_str(),
                            if report.is_success() { "success" } else { "failed" },
                        ])
                        .inc();
                    metrics::ITEM_DURATION
                        .with_label_values(&[stage.as_str()])
                        .observe(report.duration_ms as f64 / 1000.0);

                    let _ = tx.send(DispatchEvent::Completed(report)).await;
                });
            }

            drop(tx);
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    error!(pool = %name, "Dispatcher task aborted: {}", e);
                }
            }
            debug!(pool = %name, "All items dispatched and finished");
        });

        rx
    }
}

/// Runs one item with retries, converting panics into failures.
async fn run_item<W>(worker: &W, item: ItemId, retry: &RetryConfig) -> ItemReport
where
    W: ItemWorker + ?Sized,
{
    let start = Instant::now();
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let result = AssertUnwindSafe(worker.execute(item))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(ItemFailure::permanent(format!(
                    "worker panicked: {}",
                    panic_message(panic.as_ref())
                )))
            });

        match result {
            Ok(success) => return ItemReport::succeeded(item, success, attempt, start.elapsed()),
            Err(failure) if failure.retryable && attempt < max_attempts => {
                let delay = retry.delay_for(attempt);
                debug!(
                    %item,
                    attempt,
                    cause = %failure.cause,
                    "Retrying in {:?}", delay
                );
                metrics::RETRY_ATTEMPTS
                    .with_label_values(&[worker.stage().as_str()])
                    .inc();
                tokio::time::sleep(delay).await;
            }
            Err(failure) => {
                return ItemReport::failed(item, failure.cause, attempt, start.elapsed());
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{ItemSuccess, Stage};
    use crate::item::item_range;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    /// Sleeps, then fails on the configured items.
    struct SleepyWorker {
        fail: HashSet<u32>,
        delay: Duration,
    }

    #[async_trait]
    impl ItemWorker for SleepyWorker {
        fn stage(&self) -> Stage {
            Stage::Fetch
        }

        async fn execute(&self, item: ItemId) -> Result<ItemSuccess, ItemFailure> {
            tokio::time::sleep(self.delay).await;
            if self.fail.contains(&item.get()) {
                return Err(ItemFailure::permanent(format!("boom {}", item.get())));
            }
            Ok(ItemSuccess {
                path: PathBuf::from(format!("{}.png", item.get())),
                size_bytes: 1,
            })
        }
    }

    /// Fails transiently until the given attempt.
    struct FlakyWorker {
        succeed_on: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ItemWorker for FlakyWorker {
        fn stage(&self) -> Stage {
            Stage::Fetch
        }

        async fn execute(&self, _item: ItemId) -> Result<ItemSuccess, ItemFailure> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call < self.succeed_on {
                return Err(ItemFailure::transient("HTTP 503"));
            }
            Ok(ItemSuccess {
                path: PathBuf::from("x"),
                size_bytes: 0,
            })
        }
    }

    struct PanickyWorker;

    #[async_trait]
    impl ItemWorker for PanickyWorker {
        fn stage(&self) -> Stage {
            Stage::Transform
        }

        async fn execute(&self, item: ItemId) -> Result<ItemSuccess, ItemFailure> {
            if item.get() == 2 {
                panic!("corrupt state");
            }
            Ok(ItemSuccess {
                path: PathBuf::from("ok"),
                size_bytes: 0,
            })
        }
    }

    async fn collect(mut rx: mpsc::Receiver<DispatchEvent>) -> (usize, Vec<ItemReport>) {
        let mut started = 0;
        let mut reports = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                DispatchEvent::Started { .. } => started += 1,
                DispatchEvent::Completed(report) => reports.push(report),
            }
        }
        (started, reports)
    }

    #[test]
    fn test_zero_width_rejected() {
        let result = BoundedDispatcher::new("fetch", DispatcherConfig::default().with_max_concurrency(0));
        assert!(matches!(result, Err(DispatchError::ZeroWidth)));
    }

    #[tokio::test]
    async fn test_every_item_dispatched_once() {
        let pool = BoundedDispatcher::new("fetch", DispatcherConfig::default().with_max_concurrency(3)).unwrap();
        let worker = Arc::new(SleepyWorker {
            fail: HashSet::from([4]),
            delay: Duration::from_millis(5),
        });

        let (started, reports) = collect(pool.dispatch(item_range(10), worker)).await;
        assert_eq!(started, 10);
        assert_eq!(reports.len(), 10);

        let ids: HashSet<u32> = reports.iter().map(|r| r.item.get()).collect();
        assert_eq!(ids.len(), 10);

        let failed: Vec<&ItemReport> = reports.iter().filter(|r| !r.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].item.get(), 4);
        assert_eq!(failed[0].outcome.cause(), Some("boom 4"));

        let status = pool.status();
        assert_eq!(status.active_jobs, 0);
        assert_eq!(status.total_processed, 9);
        assert_eq!(status.total_failed, 1);
        assert!(status.peak_active <= 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_width_is_respected() {
        let pool = BoundedDispatcher::new("fetch", DispatcherConfig::default().with_max_concurrency(2)).unwrap();
        let worker = Arc::new(SleepyWorker {
            fail: HashSet::new(),
            delay: Duration::from_millis(20),
        });

        let (_, reports) = collect(pool.dispatch(item_range(12), worker)).await;
        assert_eq!(reports.len(), 12);
        assert!(pool.status().peak_active <= 2);
        assert!(pool.status().peak_active >= 1);
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let config = DispatcherConfig::default().with_max_concurrency(1).with_retry(
            RetryConfig::default()
                .with_max_attempts(3)
                .with_initial_delay(Duration::from_millis(1)),
        );
        let pool = BoundedDispatcher::new("fetch", config).unwrap();
        let worker = Arc::new(FlakyWorker {
            succeed_on: 3,
            calls: AtomicU32::new(0),
        });

        let (_, reports) = collect(pool.dispatch(item_range(1), Arc::clone(&worker))).await;
        assert!(reports[0].is_success());
        assert_eq!(reports[0].attempts, 3);
        assert_eq!(worker.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let pool = BoundedDispatcher::new("fetch", DispatcherConfig::default()).unwrap();
        let worker = Arc::new(FlakyWorker {
            succeed_on: 2,
            calls: AtomicU32::new(0),
        });

        let (_, reports) = collect(pool.dispatch(item_range(1), Arc::clone(&worker))).await;
        assert!(!reports[0].is_success());
        assert_eq!(reports[0].attempts, 1);
        assert_eq!(worker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let pool = BoundedDispatcher::new("transform", DispatcherConfig::default().with_max_concurrency(1)).unwrap();

        let (_, reports) = collect(pool.dispatch(item_range(3), Arc::new(PanickyWorker))).await;
        assert_eq!(reports.len(), 3);
        let failed: Vec<&ItemReport> = reports.iter().filter(|r| !r.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].item.get(), 2);
        assert!(failed[0].outcome.cause().unwrap().contains("corrupt state"));
    }

    #[tokio::test]
    async fn test_width_one_preserves_order() {
        let pool = BoundedDispatcher::new("transform", DispatcherConfig::default().with_max_concurrency(1)).unwrap();
        let worker = Arc::new(SleepyWorker {
            fail: HashSet::new(),
            delay: Duration::from_millis(1),
        });

        let (_, reports) = collect(pool.dispatch(item_range(6), worker)).await;
        let order: Vec<u32> = reports.iter().map(|r| r.item.get()).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_empty_dispatch_closes() {
        let pool = BoundedDispatcher::new("fetch", DispatcherConfig::default()).unwrap();
        let worker = Arc::new(PanickyWorker);
        let (started, reports) = collect(pool.dispatch(Vec::new(), worker)).await;
        assert_eq!(started, 0);
        assert!(reports.is_empty());
    }
}
