//! Run aggregator: the single consumer of dispatcher events.

use chrono::Utc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ledger::ItemLedger;
use super::types::{FailureRecord, RunProgress, RunSummary, StageProgress};
use crate::dispatcher::{DispatchEvent, ItemReport, ItemState, Stage};
use crate::item::ItemId;

/// Collects the results of one stage run.
///
/// Counters are only mutated here, by whoever drives the aggregator, so the
/// many concurrent completions of a pool are serialized through the event
/// channel.
pub struct RunAggregator {
    run_id: Uuid,
    stage: Stage,
    started: Instant,
    started_at: chrono::DateTime<Utc>,
    ledger: ItemLedger,
    succeeded: usize,
    failures: Vec<FailureRecord>,
    in_flight: usize,
    peak_in_flight: usize,
    progress_tx: Option<mpsc::Sender<StageProgress>>,
    watch_tx: watch::Sender<RunProgress>,
}

impl RunAggregator {
    /// Creates an aggregator for the given items. The clock starts now.
    pub fn new(stage: Stage, items: &[ItemId]) -> Self {
        let ledger = ItemLedger::new(items);
        let (watch_tx, _) = watch::channel(RunProgress::initial(stage, ledger.len()));

        Self {
            run_id: Uuid::new_v4(),
            stage,
            started: Instant::now(),
            started_at: Utc::now(),
            ledger,
            succeeded: 0,
            failures: Vec::new(),
            in_flight: 0,
            peak_in_flight: 0,
            progress_tx: None,
            watch_tx,
        }
    }

    /// Uses a caller-provided run id (e.g. shared by both stages).
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    /// Sends push-style progress updates to `tx`.
    pub fn with_progress(mut self, tx: mpsc::Sender<StageProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Pull-style observation of the run.
    pub fn subscribe(&self) -> watch::Receiver<RunProgress> {
        self.watch_tx.subscribe()
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> RunProgress {
        let total = self.ledger.len();
        let completed = self.succeeded + self.failures.len();
        let elapsed_secs = self.started.elapsed().as_secs_f64();

        RunProgress {
            stage: self.stage,
            completed,
            total,
            succeeded: self.succeeded,
            failed: self.failures.len(),
            in_flight: self.in_flight,
            fraction: if total == 0 {
                1.0
            } else {
                completed as f64 / total as f64
            },
            items_per_sec: if elapsed_secs > 0.0 {
                completed as f64 / elapsed_secs
            } else {
                0.0
            },
            elapsed_secs,
        }
    }

    /// Whether every item reached a terminal state.
    pub fn is_complete(&self) -> bool {
        self.ledger.is_complete()
    }

    /// Applies one dispatcher event.
    pub async fn record(&mut self, event: DispatchEvent) {
        match event {
            DispatchEvent::Started { item } => {
                if let Err(e) = self.ledger.transition(item, ItemState::InFlight) {
                    warn!(stage = %self.stage, "Ignoring start event: {}", e);
                    return;
                }
                self.in_flight += 1;
                self.peak_in_flight = self.peak_in_flight.max(self.in_flight);
                self.watch_tx.send_replace(self.progress());
            }
            DispatchEvent::Completed(report) => self.record_report(report).await,
        }
    }

    async fn record_report(&mut self, report: ItemReport) {
        let next = if report.is_success() {
            ItemState::Succeeded
        } else {
            ItemState::Failed
        };

        let previous = match self.ledger.transition(report.item, next) {
            Ok(previous) => previous,
            Err(e) => {
                warn!(stage = %self.stage, "Ignoring completion event: {}", e);
                return;
            }
        };
        if previous == ItemState::InFlight {
            self.in_flight = self.in_flight.saturating_sub(1);
        }

        match report.outcome.cause() {
            None => {
                debug!(
                    stage = %self.stage,
                    item = %report.item,
                    attempts = report.attempts,
                    duration_ms = report.duration_ms,
                    "Item succeeded"
                );
                self.succeeded += 1;
            }
            Some(cause) => {
                warn!(
                    stage = %self.stage,
                    item = %report.item,
                    attempts = report.attempts,
                    "Item failed: {}",
                    cause
                );
                self.failures.push(FailureRecord {
                    item: report.item,
                    cause: cause.to_string(),
                });
            }
        }

        let progress = self.progress();
        self.watch_tx.send_replace(progress.clone());

        if let Some(ref tx) = self.progress_tx {
            let _ = tx
                .send(StageProgress::ItemFinished {
                    stage: self.stage,
                    item: report.item,
                    success: report.is_success(),
                    cause: report.outcome.cause().map(String::from),
                    completed: progress.completed,
                    total: progress.total,
                    items_per_sec: progress.items_per_sec,
                })
                .await;
        }
    }

    /// Consumes events until the channel closes, then finalizes.
    ///
    /// Items that never reported (the channel closed early) are recorded as
    /// failures so that the summary still accounts for every item.
    pub async fn drain(mut self, mut events: mpsc::Receiver<DispatchEvent>) -> RunSummary {
        if let Some(ref tx) = self.progress_tx {
            let _ = tx
                .send(StageProgress::Started {
                    stage: self.stage,
                    total: self.ledger.len(),
                })
                .await;
        }

        while let Some(event) = events.recv().await {
            self.record(event).await;
        }

        for item in self.ledger.unfinished() {
            self.record_report(ItemReport::failed(
                item,
                "no result received",
                0,
                Default::default(),
            ))
            .await;
        }

        let progress_tx = self.progress_tx.take();
        let summary = self.finalize();
        if let Some(tx) = progress_tx {
            let finished = StageProgress::Finished {
                stage: summary.stage,
                attempted: summary.attempted,
                failed: summary.failed(),
                elapsed_secs: summary.elapsed_secs,
            };
            if tx.send(finished).await.is_err() {
                debug!(stage = %summary.stage, "Progress receiver dropped before stage end");
            }
        }

        info!(
            stage = %summary.stage,
            attempted = summary.attempted,
            failed = summary.failed(),
            elapsed_secs = summary.elapsed_secs,
            "Stage finished"
        );
        summary
    }

    /// Builds the summary from what has been recorded so far.
    ///
    /// Emits nothing; `drain` sends the `Finished` progress event.
    pub fn finalize(self) -> RunSummary {
        let elapsed_secs = self.started.elapsed().as_secs_f64();
        let attempted = self.ledger.len();

        RunSummary {
            run_id: self.run_id,
            stage: self.stage,
            started_at: self.started_at,
            finished_at: Utc::now(),
            attempted,
            succeeded: self.succeeded,
            failures: self.failures,
            elapsed_secs,
            avg_secs_per_item: if attempted == 0 {
                0.0
            } else {
                elapsed_secs / attempted as f64
            },
            items_per_sec: if elapsed_secs > 0.0 {
                attempted as f64 / elapsed_secs
            } else {
                0.0
            },
            peak_in_flight: self.peak_in_flight,
        }
    }
}
