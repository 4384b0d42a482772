//! Live status output.
//!
//! Subscribes to the pipeline state and prints each new status line as it
//! appears, then the labelled records once the run reaches a terminal stage.

use crate::models::Snapshot;
use std::io::Write;
use tokio::sync::watch;
use tracing::warn;

/// Print status lines until the run ends or the state handle is dropped.
///
/// Returns the writer so callers can inspect what was written.
pub async fn report_progress<W: Write>(mut rx: watch::Receiver<Snapshot>, mut out: W) -> W {
    let mut printed = 0usize;
    loop {
        let finished = {
            let snapshot = rx.borrow_and_update();
            if let Err(e) = write_new_lines(&snapshot, printed, &mut out) {
                warn!(error = %e, "Failed to write progress");
            }
            printed = snapshot.log.len();
            if snapshot.stage.is_terminal() {
                if let Err(e) = write_records(&snapshot, &mut out) {
                    warn!(error = %e, "Failed to write records");
                }
                true
            } else {
                false
            }
        };
        if finished || rx.changed().await.is_err() {
            break;
        }
    }
    out
}

fn write_new_lines<W: Write>(
    snapshot: &Snapshot,
    printed: usize,
    out: &mut W,
) -> std::io::Result<()> {
    for line in snapshot.log.iter().skip(printed) {
        writeln!(out, "[{}] {}", line.at.format("%H:%M:%S"), line.message)?;
    }
    out.flush()
}

fn write_records<W: Write>(snapshot: &Snapshot, out: &mut W) -> std::io::Result<()> {
    for record in &snapshot.records {
        writeln!(
            out,
            "\n{}\n{}\nSentiment: {}",
            record.title.trim(),
            record.content,
            record.sentiment
        )?;
    }
    out.flush()
}
