//! Configuration for the fetch stage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::dispatcher::{DispatcherConfig, RetryConfig};
use crate::item::AssetNaming;

/// Configuration for the fetch stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base address; items are fetched from `{base_url}/{name}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Number of items (identifiers `1..=count`).
    #[serde(default = "default_count")]
    pub count: u32,

    /// Maximum concurrent requests.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Directory receiving fetched assets.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File extension of remote and local assets.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Zero-padding width of file names.
    #[serde(default = "default_pad_width")]
    pub pad_width: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_base_url() -> String {
    "https://raw.githubusercontent.com/HybridShivam/Pokemon/master/assets/imagesHQ".to_string()
}

fn default_count() -> u32 {
    150
}

fn default_concurrency() -> usize {
    32
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("pokemon_dataset")
}

fn default_extension() -> String {
    "png".to_string()
}

fn default_pad_width() -> usize {
    3
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("spritefetch/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            count: default_count(),
            concurrency: default_concurrency(),
            output_dir: default_output_dir(),
            extension: default_extension(),
            pad_width: default_pad_width(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            retry: RetryConfig::default(),
        }
    }
}

impl FetchConfig {
    /// Naming scheme shared by remote addresses and local files.
    pub fn naming(&self) -> AssetNaming {
        AssetNaming::new(self.pad_width, &self.extension)
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pool configuration for the fetch stage.
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig::default()
            .with_max_concurrency(self.concurrency)
            .with_retry(self.retry.clone())
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the item count.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Sets the pool width.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
