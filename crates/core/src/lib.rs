pub mod aggregator;
pub mod config;
pub mod dispatcher;
pub mod fetcher;
pub mod item;
pub mod metrics;
pub mod runner;
pub mod store;
pub mod testing;
pub mod transform;

pub use aggregator::{FailureRecord, PipelineReport, RunAggregator, RunProgress, RunSummary, StageProgress};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, LogFormat,
};
pub use dispatcher::{BoundedDispatcher, DispatcherConfig, ItemReport, ItemWorker, RetryConfig, Stage};
pub use fetcher::{AssetSource, FetchConfig, FetchError, HttpAssetSource};
pub use item::{item_range, AssetNaming, ItemId};
pub use runner::{
    run_fetch_stage, run_http_fetch_stage, run_pipeline, run_pipeline_with_source,
    run_transform_stage, RunError,
};
pub use store::{AssetStore, StoreError};
pub use transform::{FilterChain, TransformConfig, TransformError};

/// Renders an error and its sources on one line, outermost first.
pub(crate) fn error_chain(error: &dyn std::error::Error) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(err) = source {
        chain.push_str(": ");
        chain.push_str(&err.to_string());
        source = err.source();
    }
    chain
}
