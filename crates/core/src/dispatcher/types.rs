//! Types shared by the dispatcher, its workers and the aggregator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::item::ItemId;

/// Pipeline stage an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Transform,
}

impl Stage {
    /// Stable lowercase name, used for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Transform => "transform",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a worker produced for an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSuccess {
    /// Path of the persisted asset.
    pub path: PathBuf,
    /// Size of the persisted asset in bytes.
    pub size_bytes: u64,
}

/// Why a worker invocation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Short human-readable cause.
    pub cause: String,
    /// Whether another attempt could succeed.
    pub retryable: bool,
}

impl ItemFailure {
    /// A failure another attempt will not fix.
    pub fn permanent(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            retryable: false,
        }
    }

    /// A failure that may go away on retry.
    pub fn transient(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            retryable: true,
        }
    }
}

/// Terminal outcome of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Succeeded { path: PathBuf, size_bytes: u64 },
    Failed { cause: String },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Succeeded { .. })
    }

    /// Failure cause, if any.
    pub fn cause(&self) -> Option<&str> {
        match self {
            ItemOutcome::Succeeded { .. } => None,
            ItemOutcome::Failed { cause } => Some(cause),
        }
    }
}

/// Result of one dispatched item. Produced exactly once per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    pub item: ItemId,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
    /// Number of attempts made, including the first.
    pub attempts: u32,
    /// Wall-clock time spent on the item, retries included.
    pub duration_ms: u64,
}

impl ItemReport {
    pub fn succeeded(item: ItemId, success: ItemSuccess, attempts: u32, duration: Duration) -> Self {
        Self {
            item,
            outcome: ItemOutcome::Succeeded {
                path: success.path,
                size_bytes: success.size_bytes,
            },
            attempts,
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn failed(item: ItemId, cause: impl Into<String>, attempts: u32, duration: Duration) -> Self {
        Self {
            item,
            outcome: ItemOutcome::Failed {
                cause: cause.into(),
            },
            attempts,
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Event emitted by the dispatcher, in the order things happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// The item acquired a pool slot and its worker is running.
    Started { item: ItemId },
    /// The item reached a terminal state.
    Completed(ItemReport),
}

/// Per-item lifecycle: `Pending → InFlight → {Succeeded | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

impl ItemState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemState::Succeeded | ItemState::Failed)
    }

    /// Whether `self → next` is a legal transition.
    ///
    /// `Pending → terminal` is allowed for items that fail before a slot is
    /// acquired.
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        match (self, next) {
            (ItemState::Pending, ItemState::InFlight) => true,
            (ItemState::Pending, s) | (ItemState::InFlight, s) => s.is_terminal(),
            _ => false,
        }
    }
}

/// Status of a dispatcher pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Pool name (e.g., "fetch", "transform").
    pub name: String,
    /// Number of active invocations.
    pub active_jobs: usize,
    /// Maximum concurrent invocations.
    pub max_concurrent: usize,
    /// Highest number of simultaneously active invocations observed.
    pub peak_active: usize,
    /// Total items finished successfully since creation.
    pub total_processed: u64,
    /// Total items failed since creation.
    pub total_failed: u64,
}
