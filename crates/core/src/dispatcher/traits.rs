//! Trait definitions for the dispatcher module.

use async_trait::async_trait;

use super::types::{ItemFailure, ItemSuccess, Stage};
use crate::item::ItemId;

/// Per-item body run inside a dispatcher slot.
///
/// Implementations convert every error into an [`ItemFailure`]; a panic is
/// caught by the dispatcher and recorded as a failure for that item.
#[async_trait]
pub trait ItemWorker: Send + Sync {
    /// Stage this worker belongs to.
    fn stage(&self) -> Stage;

    /// Processes one item.
    async fn execute(&self, item: ItemId) -> Result<ItemSuccess, ItemFailure>;
}
