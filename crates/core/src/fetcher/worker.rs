//! Fetch worker: one retrieval plus one atomic write per item.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::traits::AssetSource;
use crate::dispatcher::{ItemFailure, ItemSuccess, ItemWorker, Stage};
use crate::item::ItemId;
use crate::store::AssetStore;

/// Fetches an item from an [`AssetSource`] and persists it in an [`AssetStore`].
pub struct FetchWorker<S: ?Sized> {
    source: Arc<S>,
    store: AssetStore,
}

impl<S: AssetSource + ?Sized> FetchWorker<S> {
    pub fn new(source: Arc<S>, store: AssetStore) -> Self {
        Self { source, store }
    }

    /// Destination store.
    pub fn store(&self) -> &AssetStore {
        &self.store
    }
}

#[async_trait]
impl<S: AssetSource + ?Sized> ItemWorker for FetchWorker<S> {
    fn stage(&self) -> Stage {
        Stage::Fetch
    }

    async fn execute(&self, item: ItemId) -> Result<ItemSuccess, ItemFailure> {
        let payload = self.source.retrieve(item).await.map_err(|e| ItemFailure {
            cause: e.cause(),
            retryable: e.is_retryable(),
        })?;

        let stored = self
            .store
            .persist(item, &payload)
            .await
            .map_err(|e| ItemFailure::permanent(super::FetchError::from(e).cause()))?;

        debug!(
            %item,
            source = self.source.name(),
            size_bytes = stored.size_bytes,
            sha256 = %stored.sha256,
            "Fetched {:?}",
            stored.path
        );

        Ok(ItemSuccess {
            path: stored.path,
            size_bytes: stored.size_bytes,
        })
    }
}
