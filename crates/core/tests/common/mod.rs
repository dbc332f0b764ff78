//! Shared helpers: an in-process HTTP asset host and directory utilities.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tempfile::TempDir;

use spritefetch_core::testing::fixtures;
use spritefetch_core::{Config, FetchConfig};

/// Behavior of the asset host.
#[derive(Default)]
pub struct HostBehavior {
    /// File names answered with 404.
    pub missing: HashSet<String>,
    /// File names answered only after this delay.
    pub slow: HashMap<String, Duration>,
    /// Delay applied to every request.
    pub latency: Duration,
    /// File names whose body is not an image.
    pub garbage: HashSet<String>,
}

impl HostBehavior {
    pub fn missing(mut self, name: &str) -> Self {
        self.missing.insert(name.to_string());
        self
    }

    pub fn slow(mut self, name: &str, delay: Duration) -> Self {
        self.slow.insert(name.to_string(), delay);
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn garbage(mut self, name: &str) -> Self {
        self.garbage.insert(name.to_string());
        self
    }
}

struct HostState {
    behavior: HostBehavior,
    requests: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// Image host bound to an ephemeral loopback port.
pub struct AssetHost {
    addr: SocketAddr,
    state: Arc<HostState>,
}

impl AssetHost {
    pub async fn start(behavior: HostBehavior) -> Self {
        let state = Arc::new(HostState {
            behavior,
            requests: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/sprites/{name}", get(serve_asset))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind asset host");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Asset host failed");
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/sprites", self.addr)
    }

    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Highest number of requests served at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }

    /// Body served for a file name.
    pub fn body_for(name: &str) -> Vec<u8> {
        let index: u32 = name
            .split('.')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(1);
        fixtures::png_bytes(8 + index % 5, 8)
    }
}

async fn serve_asset(
    State(state): State<Arc<HostState>>,
    UrlPath(name): UrlPath<String>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let now = state.active.fetch_add(1, Ordering::SeqCst) + 1;
    state.peak.fetch_max(now, Ordering::SeqCst);

    let behavior = &state.behavior;
    let delay = behavior.slow.get(&name).copied().unwrap_or(behavior.latency);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let response = if behavior.missing.contains(&name) {
        (StatusCode::NOT_FOUND, "not found").into_response()
    } else if behavior.garbage.contains(&name) {
        (StatusCode::OK, Bytes::from_static(b"<html>not an image</html>")).into_response()
    } else {
        (StatusCode::OK, AssetHost::body_for(&name)).into_response()
    };

    state.active.fetch_sub(1, Ordering::SeqCst);
    response
}

/// Configuration rooted in a temporary directory and pointed at `host`.
pub fn config_for(root: &TempDir, host: &AssetHost, count: u32, concurrency: usize) -> Config {
    let mut config = Config::default();
    config.fetch = FetchConfig::default()
        .with_base_url(host.base_url())
        .with_count(count)
        .with_concurrency(concurrency)
        .with_timeout(5)
        .with_output_dir(root.path().join("pokemon_dataset"));
    config.transform.output_dir = root.path().join("pokemon_processed");
    config
}

/// Sorted file names in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read dir")
        .map(|e| e.expect("Bad dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn asset_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("{:03}.png", index))
}
