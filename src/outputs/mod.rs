//! Output generation for a finished run.
//!
//! # Submodules
//!
//! - [`json`]: writes the [`DigestReport`](crate::models::DigestReport) as JSON
//! - [`markdown`]: renders the report as a readable Markdown digest
//! - [`progress`]: prints the status log live while the pipeline runs
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── 14-30-05.json
//!
//! markdown_output_dir/
//! └── 2025-05-06_14-30-05.md
//! ```

pub mod json;
pub mod markdown;
pub mod progress;

use crate::models::DigestReport;

/// `HH-MM-SS` form of the report time, safe for file names.
pub(crate) fn file_stem(report: &DigestReport) -> String {
    report.local_time.replace(':', "-")
}
