//! Trait definitions for the fetcher module.

use async_trait::async_trait;

use super::error::FetchError;
use crate::item::ItemId;

/// A source of remote assets.
///
/// Implementations perform exactly one retrieval attempt per call; retrying
/// is left to the dispatcher.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Returns the name of this source implementation.
    fn name(&self) -> &str;

    /// Remote address of an item.
    fn locate(&self, item: ItemId) -> String;

    /// Retrieves the full payload of an item.
    async fn retrieve(&self, item: ItemId) -> Result<Vec<u8>, FetchError>;
}
