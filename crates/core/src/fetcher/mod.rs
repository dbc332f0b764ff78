//! Fetcher module for retrieving remote assets.
//!
//! This module provides the `AssetSource` trait, an HTTP implementation and
//! the `FetchWorker` that plugs a source and an `AssetStore` into the
//! dispatcher.
//!
//! # Example
//!
//! ```ignore
//! use spritefetch_core::fetcher::{FetchConfig, FetchWorker, HttpAssetSource};
//! use spritefetch_core::store::AssetStore;
//!
//! let config = FetchConfig::default().with_count(5);
//! let source = Arc::new(HttpAssetSource::new(&config)?);
//! let store = AssetStore::new(&config.output_dir, config.naming());
//! let worker = FetchWorker::new(source, store);
//!
//! let result = worker.execute(ItemId::new(1).unwrap()).await;
//! ```

mod config;
mod error;
mod http;
mod traits;
mod worker;

pub use config::FetchConfig;
pub use error::FetchError;
pub use http::HttpAssetSource;
pub use traits::AssetSource;
pub use worker::FetchWorker;
