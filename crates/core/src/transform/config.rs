//! Configuration for the transform stage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dispatcher::DispatcherConfig;

/// Configuration for the transform stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Directory receiving processed assets.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum concurrent transforms (1 keeps the run sequential).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// JPEG quality (1-100). PNG output is always lossless.
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Filter chain parameters.
    #[serde(default)]
    pub filters: FilterConfig,
}

/// Parameters of the fixed filter chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Sigma of the first gaussian blur; 0 disables it.
    #[serde(default = "default_blur_radius")]
    pub blur_radius: f32,

    /// Contrast factor; 1.0 leaves the image unchanged.
    #[serde(default = "default_contrast_factor")]
    pub contrast_factor: f32,

    #[serde(default = "default_true")]
    pub edge_enhance: bool,

    #[serde(default = "default_true")]
    pub invert: bool,

    /// Sigma of the second gaussian blur; 0 disables it.
    #[serde(default = "default_second_blur_radius")]
    pub second_blur_radius: f32,

    /// Upscale factor of the resample pass; 1 or less disables it.
    #[serde(default = "default_resample_factor")]
    pub resample_factor: u32,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("pokemon_processed")
}

fn default_concurrency() -> usize {
    1
}

fn default_quality() -> u8 {
    95
}

fn default_blur_radius() -> f32 {
    10.0
}

fn default_contrast_factor() -> f32 {
    1.5
}

fn default_true() -> bool {
    true
}

fn default_second_blur_radius() -> f32 {
    5.0
}

fn default_resample_factor() -> u32 {
    2
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            concurrency: default_concurrency(),
            quality: default_quality(),
            filters: FilterConfig::default(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blur_radius: default_blur_radius(),
            contrast_factor: default_contrast_factor(),
            edge_enhance: true,
            invert: true,
            second_blur_radius: default_second_blur_radius(),
            resample_factor: default_resample_factor(),
        }
    }
}

impl TransformConfig {
    /// Pool configuration for the transform stage. Transforms are never retried.
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig::default().with_max_concurrency(self.concurrency)
    }

    /// Sets the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the pool width.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}
