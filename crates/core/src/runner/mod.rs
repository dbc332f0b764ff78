//! Stage runner: wires configuration, stores, pool, workers and aggregator
//! together for one fetch run, one transform run, or both in sequence.
//!
//! Fatal problems (invalid configuration, unusable directories, pool or
//! client construction) are returned as `RunError` before any item starts.
//! Everything that goes wrong for a single item ends up in the summary.

mod error;
mod stages;

pub use error::RunError;
pub use stages::{
    run_fetch_stage, run_http_fetch_stage, run_pipeline, run_pipeline_with_source,
    run_transform_stage, ProgressSender,
};
