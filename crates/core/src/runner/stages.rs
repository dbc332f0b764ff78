//! Stage drivers: validate, prepare directories, dispatch, aggregate.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use super::error::RunError;
use crate::aggregator::{PipelineReport, RunAggregator, RunSummary, StageProgress};
use crate::config::{validate_config, validate_fetch, validate_transform, Config, ConfigError};
use crate::dispatcher::{BoundedDispatcher, ItemWorker, Stage};
use crate::fetcher::{AssetSource, FetchConfig, FetchWorker, HttpAssetSource};
use crate::item::{item_range, ItemId};
use crate::store::AssetStore;
use crate::transform::{FilterChain, TransformWorker};

/// Push-style progress channel shared by the stage drivers.
pub type ProgressSender = mpsc::Sender<StageProgress>;

/// Fetches items `1..=count` from `source` into the fetch output directory.
pub async fn run_fetch_stage<S>(
    config: &FetchConfig,
    source: Arc<S>,
    progress: Option<ProgressSender>,
) -> Result<RunSummary, RunError>
where
    S: AssetSource + ?Sized + 'static,
{
    fetch_stage(config, source, progress, Uuid::new_v4()).await
}

/// Fetches over HTTP as configured.
pub async fn run_http_fetch_stage(
    config: &FetchConfig,
    progress: Option<ProgressSender>,
) -> Result<RunSummary, RunError> {
    validate_fetch(config)?;
    let source = Arc::new(HttpAssetSource::new(config).map_err(RunError::Client)?);
    run_fetch_stage(config, source, progress).await
}

/// Transforms every asset found in the fetch output directory.
pub async fn run_transform_stage(
    config: &Config,
    progress: Option<ProgressSender>,
) -> Result<RunSummary, RunError> {
    transform_stage(config, progress, Uuid::new_v4()).await
}

/// Runs the fetch stage over HTTP, then the transform stage.
pub async fn run_pipeline(
    config: &Config,
    progress: Option<ProgressSender>,
) -> Result<PipelineReport, RunError> {
    validate_config(config)?;
    let source = Arc::new(HttpAssetSource::new(&config.fetch).map_err(RunError::Client)?);
    run_pipeline_with_source(config, source, progress).await
}

/// Runs both stages with a caller-provided asset source.
pub async fn run_pipeline_with_source<S>(
    config: &Config,
    source: Arc<S>,
    progress: Option<ProgressSender>,
) -> Result<PipelineReport, RunError>
where
    S: AssetSource + ?Sized + 'static,
{
    validate_config(config)?;
    let run_id = Uuid::new_v4();

    let fetch = fetch_stage(&config.fetch, source, progress.clone(), run_id).await?;
    let transform = transform_stage(config, progress, run_id).await?;

    let report = PipelineReport::new(fetch, transform);
    info!(
        %run_id,
        fetch_secs = report.fetch.elapsed_secs,
        transform_secs = report.transform.elapsed_secs,
        total_secs = report.total_secs,
        "Pipeline finished"
    );
    Ok(report)
}

async fn fetch_stage<S>(
    config: &FetchConfig,
    source: Arc<S>,
    progress: Option<ProgressSender>,
    run_id: Uuid,
) -> Result<RunSummary, RunError>
where
    S: AssetSource + ?Sized + 'static,
{
    validate_fetch(config)?;

    let store = AssetStore::new(&config.output_dir, config.naming());
    store.ensure_dir().await.map_err(RunError::Directory)?;
    let dispatcher = BoundedDispatcher::new("fetch", config.dispatcher_config())?;

    info!(
        %run_id,
        source = source.name(),
        items = config.count,
        width = dispatcher.width(),
        "Fetching into {:?}",
        store.dir()
    );

    let worker = Arc::new(FetchWorker::new(source, store));
    Ok(execute(Stage::Fetch, &dispatcher, item_range(config.count), worker, progress, run_id).await)
}

async fn transform_stage(
    config: &Config,
    progress: Option<ProgressSender>,
    run_id: Uuid,
) -> Result<RunSummary, RunError> {
    validate_transform(&config.transform)?;
    if config.fetch.output_dir == config.transform.output_dir {
        return Err(ConfigError::ValidationError(
            "fetch.output_dir and transform.output_dir must differ".to_string(),
        )
        .into());
    }

    let naming = config.fetch.naming();
    let input = AssetStore::new(&config.fetch.output_dir, naming.clone());
    let output = AssetStore::new(&config.transform.output_dir, naming);
    output.ensure_dir().await.map_err(RunError::Directory)?;

    let items: Vec<ItemId> = input
        .list()
        .await
        .map_err(RunError::List)?
        .into_iter()
        .map(|(item, _)| item)
        .collect();

    let chain = FilterChain::from_config(&config.transform.filters);
    let dispatcher = BoundedDispatcher::new("transform", config.transform.dispatcher_config())?;

    info!(
        %run_id,
        items = items.len(),
        width = dispatcher.width(),
        filters = chain.stages().len(),
        "Transforming {:?} into {:?}",
        input.dir(),
        output.dir()
    );

    let worker = Arc::new(
        TransformWorker::new(input, output, chain, config.transform.quality)
            .map_err(RunError::Worker)?,
    );
    Ok(execute(Stage::Transform, &dispatcher, items, worker, progress, run_id).await)
}

async fn execute<W>(
    stage: Stage,
    dispatcher: &BoundedDispatcher,
    items: Vec<ItemId>,
    worker: Arc<W>,
    progress: Option<ProgressSender>,
    run_id: Uuid,
) -> RunSummary
where
    W: ItemWorker + 'static,
{
    let mut aggregator = RunAggregator::new(stage, &items).with_run_id(run_id);
    if let Some(tx) = progress {
        aggregator = aggregator.with_progress(tx);
    }

    let events = dispatcher.dispatch(items, worker);
    aggregator.drain(events).await
}
