//! Types for the aggregator module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::dispatcher::Stage;
use crate::item::ItemId;

/// One failed item, as recorded in a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub item: ItemId,
    pub cause: String,
}

/// Snapshot of a running stage (pull-style observation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunProgress {
    pub stage: Stage,
    /// Items that reached a terminal state.
    pub completed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Items currently holding a pool slot.
    pub in_flight: usize,
    /// `completed / total`, 1.0 for an empty run.
    pub fraction: f64,
    /// Completed items per second since the stage started.
    pub items_per_sec: f64,
    pub elapsed_secs: f64,
}

impl RunProgress {
    pub(crate) fn initial(stage: Stage, total: usize) -> Self {
        Self {
            stage,
            completed: 0,
            total,
            succeeded: 0,
            failed: 0,
            in_flight: 0,
            fraction: if total == 0 { 1.0 } else { 0.0 },
            items_per_sec: 0.0,
            elapsed_secs: 0.0,
        }
    }
}

/// Progress update for a stage (push-style observation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StageProgress {
    /// Stage started.
    Started { stage: Stage, total: usize },
    /// One item reached a terminal state.
    ItemFinished {
        stage: Stage,
        item: ItemId,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        cause: Option<String>,
        completed: usize,
        total: usize,
        items_per_sec: f64,
    },
    /// Stage finished.
    Finished {
        stage: Stage,
        attempted: usize,
        failed: usize,
        elapsed_secs: f64,
    },
}

/// Finalized record of one stage run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Items dispatched.
    pub attempted: usize,
    pub succeeded: usize,
    /// Failures in completion order.
    pub failures: Vec<FailureRecord>,
    pub elapsed_secs: f64,
    /// `elapsed / attempted`, 0 for an empty run.
    pub avg_secs_per_item: f64,
    pub items_per_sec: f64,
    /// Highest number of simultaneously in-flight items observed.
    pub peak_in_flight: usize,
}

impl RunSummary {
    /// Number of failed items.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Total wall-clock time.
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.elapsed_secs)
    }

    /// Whether the item appears in the failure list.
    pub fn has_failure(&self, item: ItemId) -> bool {
        self.failures.iter().any(|f| f.item == item)
    }

    /// Whether every attempted item succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Summaries of a full two-stage run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub fetch: RunSummary,
    pub transform: RunSummary,
    /// Fetch plus transform wall-clock time.
    pub total_secs: f64,
}

impl PipelineReport {
    pub fn new(fetch: RunSummary, transform: RunSummary) -> Self {
        let total_secs = fetch.elapsed_secs + transform.elapsed_secs;
        Self {
            fetch,
            transform,
            total_secs,
        }
    }
}
