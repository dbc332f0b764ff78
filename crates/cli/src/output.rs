//! Console rendering of progress events and summaries.

use std::fmt::Write;

use spritefetch_core::{PipelineReport, RunSummary, Stage, StageProgress};

fn verb(stage: Stage) -> &'static str {
    match stage {
        Stage::Fetch => "download",
        Stage::Transform => "process",
    }
}

/// One console line per progress event, `None` for events not worth a line.
pub fn render_progress(event: &StageProgress) -> Option<String> {
    match event {
        StageProgress::Started { stage, total } => {
            Some(format!("Starting {} stage with {} items...", stage, total))
        }
        StageProgress::ItemFinished {
            stage,
            item,
            success,
            cause,
            completed,
            total,
            ..
        } => {
            let line = if *success {
                format!("Successfully {}ed {:03}", verb(*stage), item.get())
            } else {
                format!(
                    "Failed to {} {:03}: {}",
                    verb(*stage),
                    item.get(),
                    cause.as_deref().unwrap_or("unknown error")
                )
            };
            Some(format!("[{}/{}] {}", completed, total, line))
        }
        StageProgress::Finished { .. } => None,
    }
}

/// Attempted/failed/time block for one stage.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} stage ({})", capitalize(summary.stage.as_str()), summary.run_id);
    let _ = writeln!(out, "  attempted: {}", summary.attempted);
    let _ = writeln!(out, "  succeeded: {}", summary.succeeded);
    let _ = writeln!(out, "  failed:    {}", summary.failed());
    for failure in &summary.failures {
        let _ = writeln!(out, "    {:03}: {}", failure.item.get(), failure.cause);
    }
    let _ = writeln!(out, "  elapsed:   {:.2} seconds", summary.elapsed_secs);
    let _ = write!(
        out,
        "  average:   {:.4} seconds per item",
        summary.avg_secs_per_item
    );
    out
}

/// Final timing table of a full run.
pub fn render_report(report: &PipelineReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", render_summary(&report.fetch));
    let _ = writeln!(out, "{}", render_summary(&report.transform));
    let _ = writeln!(out, "{:<24}{:>12}", "Stage", "Seconds");
    let _ = writeln!(out, "{:<24}{:>12.2}", "Concurrent download", report.fetch.elapsed_secs);
    let _ = writeln!(out, "{:<24}{:>12.2}", "Sequential processing", report.transform.elapsed_secs);
    let _ = write!(out, "{:<24}{:>12.2}", "Total", report.total_secs);
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
