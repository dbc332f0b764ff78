//! Item identifiers and the naming scheme shared by both stages.
//!
//! An item is one index in the contiguous range `[1, N]`. The index maps to
//! exactly one remote address and one local file name, so no two workers can
//! ever write the same path.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one unit of work (one remote asset, later one local asset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates an identifier. Returns `None` for zero, which is outside every range.
    pub fn new(index: u32) -> Option<Self> {
        (index > 0).then_some(Self(index))
    }

    /// Returns the raw index.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Produces the ordered identifiers `1..=count`.
pub fn item_range(count: u32) -> Vec<ItemId> {
    (1..=count).map(ItemId).collect()
}

/// Deterministic mapping between identifiers and file names.
///
/// `{index:0pad}.{extension}`, e.g. `007.png` with the default width of 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetNaming {
    pad_width: usize,
    extension: String,
}

impl Default for AssetNaming {
    fn default() -> Self {
        Self::new(3, "png")
    }
}

impl AssetNaming {
    /// Creates a naming scheme. A leading dot on the extension is ignored.
    pub fn new(pad_width: usize, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        Self {
            pad_width,
            extension,
        }
    }

    /// Returns the file extension (without dot).
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns the file name for an item.
    pub fn file_name(&self, item: ItemId) -> String {
        format!(
            "{:0width$}.{}",
            item.get(),
            self.extension,
            width = self.pad_width
        )
    }

    /// Returns the remote address for an item under `base_url`.
    pub fn remote_url(&self, base_url: &str, item: ItemId) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.file_name(item))
    }

    /// Parses a file name produced by [`AssetNaming::file_name`].
    ///
    /// Only the exact canonical name is accepted, so `7.png` or `0007.png`
    /// are not assets under a pad width of 3 and every identifier maps back
    /// to a single file. Indices wider than the pad width (`1000.png`) are
    /// canonical too.
    pub fn parse(&self, file_name: &str) -> Option<ItemId> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        if ext != self.extension {
            return None;
        }
        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let item = stem.parse::<u32>().ok().and_then(ItemId::new)?;
        (self.file_name(item) == file_name).then_some(item)
    }
}
