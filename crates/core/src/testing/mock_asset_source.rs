//! Mock asset source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetcher::{AssetSource, FetchError};
use crate::item::ItemId;

/// Scripted failure for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Status(u16),
    Timeout,
    /// Fail with a timeout this many more times, then succeed.
    Transient(u32),
}

/// Mock implementation of the AssetSource trait.
///
/// Provides controllable behavior for testing:
/// - Per-item HTTP status or timeout failures
/// - Items that fail a fixed number of times before succeeding
/// - Simulated latency
/// - Call counting and peak concurrency tracking
///
/// # Example
///
/// ```rust,ignore
/// use spritefetch_core::testing::MockAssetSource;
///
/// let source = MockAssetSource::new().with_delay(Duration::from_millis(20));
/// source.fail_with_status(ItemId::new(2).unwrap(), 404).await;
///
/// // Run a fetch stage against it...
///
/// assert!(source.peak_concurrency() <= 4);
/// ```
#[derive(Debug)]
pub struct MockAssetSource {
    failures: Arc<RwLock<HashMap<ItemId, Failure>>>,
    calls: Arc<RwLock<HashMap<ItemId, u32>>>,
    delay: Duration,
    png_size: Option<(u32, u32)>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Default for MockAssetSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAssetSource {
    /// Create a new mock source that serves every item immediately.
    pub fn new() -> Self {
        Self {
            failures: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(HashMap::new())),
            delay: Duration::ZERO,
            png_size: None,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Sleep this long inside every retrieval.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Serve decodable PNG images instead of opaque payloads.
    pub fn with_png_payloads(mut self, width: u32, height: u32) -> Self {
        self.png_size = Some((width, height));
        self
    }

    /// Opaque payload served for an item.
    pub fn payload_for(item: ItemId) -> Vec<u8> {
        format!("asset-{:03}", item.get()).into_bytes()
    }

    /// Answer requests for `item` with an HTTP status.
    pub async fn fail_with_status(&self, item: ItemId, status: u16) {
        self.failures.write().await.insert(item, Failure::Status(status));
    }

    /// Time out every request for `item`.
    pub async fn fail_with_timeout(&self, item: ItemId) {
        self.failures.write().await.insert(item, Failure::Timeout);
    }

    /// Time out the first `times` requests for `item`, then succeed.
    pub async fn fail_times(&self, item: ItemId, times: u32) {
        self.failures
            .write()
            .await
            .insert(item, Failure::Transient(times));
    }

    /// Total number of retrieval calls.
    pub async fn call_count(&self) -> u32 {
        self.calls.read().await.values().sum()
    }

    /// Number of retrieval calls for one item.
    pub async fn calls_for(&self, item: ItemId) -> u32 {
        self.calls.read().await.get(&item).copied().unwrap_or(0)
    }

    /// Highest number of retrievals observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn respond(&self, item: ItemId) -> Result<Vec<u8>, FetchError> {
        *self.calls.write().await.entry(item).or_insert(0) += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut failures = self.failures.write().await;
        match failures.get(&item).copied() {
            Some(Failure::Status(status)) => {
                return Err(FetchError::Status {
                    url: self.locate(item),
                    status,
                })
            }
            Some(Failure::Timeout) => return Err(self.timeout(item)),
            Some(Failure::Transient(remaining)) if remaining > 0 => {
                failures.insert(item, Failure::Transient(remaining - 1));
                return Err(self.timeout(item));
            }
            _ => {}
        }
        drop(failures);

        Ok(match self.png_size {
            Some((width, height)) => super::fixtures::png_bytes(width, height),
            None => Self::payload_for(item),
        })
    }

    fn timeout(&self, item: ItemId) -> FetchError {
        FetchError::Timeout {
            url: self.locate(item),
            timeout: Duration::from_secs(10),
        }
    }
}

#[async_trait]
impl AssetSource for MockAssetSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn locate(&self, item: ItemId) -> String {
        format!("mock://assets/{:03}", item.get())
    }

    async fn retrieve(&self, item: ItemId) -> Result<Vec<u8>, FetchError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = self.respond(item).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: u32) -> ItemId {
        ItemId::new(i).unwrap()
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let source = MockAssetSource::new();
        source.fail_with_status(id(1), 404).await;
        source.fail_with_timeout(id(2)).await;

        assert!(matches!(
            source.retrieve(id(1)).await,
            Err(FetchError::Status { status: 404, .. })
        ));
        assert!(matches!(
            source.retrieve(id(2)).await,
            Err(FetchError::Timeout { .. })
        ));
        assert_eq!(source.retrieve(id(3)).await.unwrap(), b"asset-003");
        assert_eq!(source.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let source = MockAssetSource::new();
        source.fail_times(id(5), 2).await;

        assert!(source.retrieve(id(5)).await.is_err());
        assert!(source.retrieve(id(5)).await.is_err());
        assert!(source.retrieve(id(5)).await.is_ok());
        assert_eq!(source.calls_for(id(5)).await, 3);
    }

    #[tokio::test]
    async fn test_png_payloads_decode() {
        let source = MockAssetSource::new().with_png_payloads(4, 3);
        let bytes = source.retrieve(id(1)).await.unwrap();
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (4, 3));
    }
}
