mod cli;
mod metrics;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use spritefetch_core::{
    load_config_or_default, run_http_fetch_stage, run_pipeline, run_transform_stage,
    validate_config, Config, LogFormat, StageProgress,
};

use cli::{Cli, Command};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for the progress channel
const PROGRESS_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config_or_default(cli.config.as_deref()).with_context(|| match cli.config {
        Some(ref path) => format!("Failed to load config from {:?}", path),
        None => "Failed to load configuration".to_string(),
    })?;
    cli.apply_overrides(&mut config);

    init_tracing(&config, cli.quiet);
    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, command = ?cli.command(), "spritefetch starting");
    if !cli.quiet {
        print_banner(&config, cli.command());
    }

    let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_BUFFER_SIZE);
    let renderer = spawn_renderer(progress_rx, cli.quiet);

    match cli.command() {
        Command::Run => {
            let report = run_pipeline(&config, Some(progress_tx))
                .await
                .context("Pipeline run failed")?;
            finish(renderer).await;
            println!("{}", output::render_report(&report));
            write_summary(cli.summary_json.as_deref(), &report)?;
        }
        Command::Fetch => {
            let summary = run_http_fetch_stage(&config.fetch, Some(progress_tx))
                .await
                .context("Fetch stage failed")?;
            finish(renderer).await;
            println!("{}", output::render_summary(&summary));
            write_summary(cli.summary_json.as_deref(), &summary)?;
        }
        Command::Transform => {
            let summary = run_transform_stage(&config, Some(progress_tx))
                .await
                .context("Transform stage failed")?;
            finish(renderer).await;
            println!("{}", output::render_summary(&summary));
            write_summary(cli.summary_json.as_deref(), &summary)?;
        }
    }

    if let Some(ref path) = config.metrics.export_path {
        metrics::export_metrics(path)?;
        info!("Metrics written to {:?}", path);
    }

    Ok(())
}

fn init_tracing(config: &Config, quiet: bool) {
    let default_level = if quiet { "warn" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());

    match config.logging.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn print_banner(config: &Config, command: Command) {
    if command != Command::Transform {
        println!(
            "Downloading {} images from {} with {} workers into {:?}",
            config.fetch.count, config.fetch.base_url, config.fetch.concurrency, config.fetch.output_dir
        );
    }
    if command != Command::Fetch {
        println!(
            "Processing images from {:?} into {:?}",
            config.fetch.output_dir, config.transform.output_dir
        );
    }
}

fn spawn_renderer(mut rx: mpsc::Receiver<StageProgress>, quiet: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if quiet {
                continue;
            }
            if let Some(line) = output::render_progress(&event) {
                println!("{}", line);
            }
        }
    })
}

async fn finish(renderer: JoinHandle<()>) {
    if let Err(e) = renderer.await {
        error!("Progress renderer failed: {}", e);
    }
}

fn write_summary<T: Serialize>(path: Option<&Path>, summary: &T) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write summary to {:?}", path))?;
    info!("Summary written to {:?}", path);
    Ok(())
}
