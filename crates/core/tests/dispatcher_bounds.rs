//! Pool width and isolation properties, checked with the mock source.

use std::sync::Arc;
use std::time::Duration;

use spritefetch_core::dispatcher::{BoundedDispatcher, DispatchEvent, DispatcherConfig};
use spritefetch_core::fetcher::FetchWorker;
use spritefetch_core::testing::MockAssetSource;
use spritefetch_core::{item_range, AssetNaming, AssetStore, ItemId, RunAggregator, Stage};
use tempfile::TempDir;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn peak_concurrency_is_bounded_for_every_width() {
    for width in [1, 2, 5, 32] {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(MockAssetSource::new().with_delay(Duration::from_millis(5)));
        let worker = Arc::new(FetchWorker::new(
            Arc::clone(&source),
            AssetStore::new(dir.path(), AssetNaming::default()),
        ));
        let pool = BoundedDispatcher::new(
            "fetch",
            DispatcherConfig::default().with_max_concurrency(width),
        )
        .unwrap();

        let items = item_range(40);
        let summary = RunAggregator::new(Stage::Fetch, &items)
            .drain(pool.dispatch(items, worker))
            .await;

        assert_eq!(summary.attempted, 40);
        assert!(summary.is_clean());
        assert!(source.peak_concurrency() <= width, "width {}", width);
        assert!(pool.status().peak_active <= width);
        assert_eq!(pool.status().active_jobs, 0);
        assert_eq!(pool.status().total_processed, 40);
    }
}

#[tokio::test]
async fn every_item_reports_exactly_once() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(MockAssetSource::new());
    for i in [3, 7, 11] {
        source.fail_with_status(ItemId::new(i).unwrap(), 500).await;
    }
    let worker = Arc::new(FetchWorker::new(
        source,
        AssetStore::new(dir.path(), AssetNaming::default()),
    ));
    let pool =
        BoundedDispatcher::new("fetch", DispatcherConfig::default().with_max_concurrency(4))
            .unwrap();

    let mut events = pool.dispatch(item_range(12), worker);
    let mut started = Vec::new();
    let mut completed = Vec::new();
    while let Some(event) = events.recv().await {
        match event {
            DispatchEvent::Started { item } => started.push(item.get()),
            DispatchEvent::Completed(report) => completed.push((report.item.get(), report.is_success())),
        }
    }

    started.sort_unstable();
    completed.sort_unstable();
    assert_eq!(started, (1..=12).collect::<Vec<_>>());
    assert_eq!(completed.len(), 12);
    for (item, success) in completed {
        assert_eq!(success, ![3, 7, 11].contains(&item), "item {}", item);
    }
    assert_eq!(pool.status().total_failed, 3);
}
