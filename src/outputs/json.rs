//! JSON output of a run.
//!
//! Reports are grouped by date, one file per run:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 08-00-12.json
//!     └── 14-30-05.json
//! ```

use crate::error::Result;
use crate::models::DigestReport;
use crate::outputs::file_stem;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`DigestReport`] to `{json_output_dir}/{date}/{HH-MM-SS}.json`.
///
/// Returns the path of the written file.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_report(report: &DigestReport, json_output_dir: &str) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(report)?;

    let full_json_dir = PathBuf::from(json_output_dir).join(&report.local_date);
    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = full_json_dir.join(format!("{}.json", file_stem(report)));
    fs::write(&path, json).await?;
    info!(path = %path.display(), records = report.records.len(), "Wrote JSON report");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Stage, Summary};

    fn report() -> DigestReport {
        DigestReport {
            local_date: "2025-05-06".to_string(),
            local_time: "14:30:05".to_string(),
            stage: Stage::Done,
            records: vec![Summary::new("https://x/a", "Title ", "Body")],
            failures: vec![],
            log: vec![],
        }
    }

    #[tokio::test]
    async fn test_write_report_layout() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().to_str().unwrap();

        let path = write_report(&report(), out).await.unwrap();
        assert_eq!(path, dir.path().join("2025-05-06").join("14-30-05.json"));

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: DigestReport = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].sentiment, "Not analyzed");
        assert_eq!(parsed.stage, Stage::Done);
    }
}
