//! Aggregation of per-item results into progress and run summaries.
//!
//! The `RunAggregator` drains the dispatcher's event channel, tracks each
//! item through `Pending → InFlight → {Succeeded | Failed}` and exposes
//! progress both as a push channel (`StageProgress`) and as a pull-style
//! `watch` receiver (`RunProgress`).

mod collector;
mod ledger;
mod types;

pub use collector::RunAggregator;
pub use ledger::{ItemLedger, TransitionError};
pub use types::{FailureRecord, PipelineReport, RunProgress, RunSummary, StageProgress};
