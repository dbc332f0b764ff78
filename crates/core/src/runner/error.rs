//! Error types for the runner module.

use thiserror::Error;

use crate::config::ConfigError;
use crate::dispatcher::DispatchError;
use crate::fetcher::FetchError;
use crate::store::StoreError;
use crate::transform::TransformError;

/// Errors that abort a stage before any item is dispatched.
///
/// Per-item failures never surface here; they end up in the `RunSummary`.
#[derive(Debug, Error)]
pub enum RunError {
    /// The configuration was rejected.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    /// An output directory could not be created.
    #[error("Output directory unavailable")]
    Directory(#[source] StoreError),

    /// The input directory could not be enumerated.
    #[error("Input directory unavailable")]
    List(#[source] StoreError),

    /// The worker pool could not be built.
    #[error("Failed to build worker pool")]
    Pool(#[from] DispatchError),

    /// The HTTP client could not be built.
    #[error("Failed to build asset source")]
    Client(#[source] FetchError),

    /// The transform worker could not be built.
    #[error("Failed to build transform worker")]
    Worker(#[source] TransformError),
}
