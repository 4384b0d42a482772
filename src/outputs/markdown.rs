//! Markdown digest of a run.

use crate::error::Result;
use crate::models::DigestReport;
use crate::outputs::file_stem;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// Render a report as Markdown: one section per record, failures last.
pub fn report_to_markdown(report: &DigestReport) -> String {
    let mut md = format!(
        "# News digest, {} {}\n\n_Run ended in stage `{}` with {} articles and {} failures._\n",
        report.local_date,
        report.local_time,
        report.stage.name(),
        report.records.len(),
        report.failures.len()
    );

    for record in &report.records {
        let title = match record.title.trim() {
            "" => "(untitled)",
            t => t,
        };
        md.push_str(&format!(
            "\n## {}\n\n{}\n\n**Sentiment:** {}\n\n[Source]({})\n",
            title, record.content, record.sentiment, record.source
        ));
    }

    if !report.failures.is_empty() {
        md.push_str("\n## Failures\n\n");
        for failure in &report.failures {
            md.push_str(&format!(
                "- `{}` {}: {}\n",
                failure.stage, failure.item, failure.error
            ));
        }
    }

    md
}

/// Write the digest to `{markdown_output_dir}/{date}_{HH-MM-SS}.md`.
#[instrument(level = "info", skip_all, fields(%markdown_output_dir))]
pub async fn write_markdown(report: &DigestReport, markdown_output_dir: &str) -> Result<PathBuf> {
    fs::create_dir_all(markdown_output_dir).await?;
    let path = PathBuf::from(markdown_output_dir)
        .join(format!("{}_{}.md", report.local_date, file_stem(report)));
    fs::write(&path, report_to_markdown(report)).await?;
    info!(path = %path.display(), "Wrote Markdown digest");
    Ok(path)
}
