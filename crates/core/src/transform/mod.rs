//! Transform module: a fixed chain of pure image filters applied to every
//! fetched asset.
//!
//! Decoding, filtering and encoding run on the blocking pool; the
//! `TransformWorker` plugs into the same dispatcher as the fetch stage.

mod chain;
mod config;
mod error;
pub mod filters;
mod worker;

pub use chain::{FilterChain, FilterStage};
pub use config::{FilterConfig, TransformConfig};
pub use error::TransformError;
pub use worker::{OutputFormat, TransformWorker};
