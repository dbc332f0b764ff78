//! Bounded dispatcher for per-item work.
//!
//! This module provides the `BoundedDispatcher`, a fixed-width pool that runs
//! one `ItemWorker` invocation per item:
//! - No more than `max_concurrency` invocations are outstanding at once
//! - One item's failure (or panic) never affects another item
//! - Events are delivered through a channel in completion order
//!
//! # Example
//!
//! ```ignore
//! use spritefetch_core::dispatcher::{BoundedDispatcher, DispatcherConfig};
//! use spritefetch_core::item::item_range;
//!
//! let pool = BoundedDispatcher::new("fetch", DispatcherConfig::default())?;
//! let mut events = pool.dispatch(item_range(150), Arc::new(worker));
//!
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! ```

mod config;
mod pool;
mod traits;
mod types;

pub use config::{DispatcherConfig, RetryConfig};
pub use pool::{BoundedDispatcher, DispatchError};
pub use traits::ItemWorker;
pub use types::{
    DispatchEvent, ItemFailure, ItemOutcome, ItemReport, ItemState, ItemSuccess, PoolStatus,
    Stage,
};
