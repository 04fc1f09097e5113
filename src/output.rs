//! Output formatting for chat replies and the `analyze` command.
//!
//! # Chat replies
//!
//! ```text
//! ✅ analysis succeeded
//! 📈 Fractal Dimension: 1.734
//! 📊 Severity: Severe
//! ```
//!
//! or, for any failure between download and analysis:
//!
//! ```text
//! ❌ error: could not decode image: ...
//! ```
//!
//! # CLI
//!
//! One line per file, in input order:
//!
//! ```text
//! photos/wall-01.jpg: fd=1.734 severity=Severe
//! photos/notes.png: error: degenerate box counts: ...
//! ```
//!
//! With `--json`, a JSON array of [`FileReport`]s instead.

use crate::analysis::{AnalysisError, AnalysisResult};
use serde::Serialize;
use std::fmt::Display;
use std::path::Path;

/// Reply text for a successful analysis.
pub fn success_reply(result: &AnalysisResult) -> String {
    format!(
        "✅ analysis succeeded\n📈 Fractal Dimension: {:.3}\n📊 Severity: {}",
        result.fractal_dimension, result.severity
    )
}

/// Reply text for a failure.
pub fn error_reply(err: &impl Display) -> String {
    format!("❌ error: {err}")
}

/// Single CLI line for one analyzed file.
pub fn format_analysis_line(
    path: &Path,
    outcome: &Result<AnalysisResult, AnalysisError>,
) -> String {
    match outcome {
        Ok(result) => format!(
            "{}: fd={:.3} severity={}",
            path.display(),
            result.fractal_dimension,
            result.severity
        ),
        Err(err) => format!("{}: error: {}", path.display(), err),
    }
}

/// One entry of `analyze --json` output.
#[derive(Debug, Serialize)]
pub struct FileReport<'a> {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> FileReport<'a> {
    pub fn new(path: &Path, outcome: &'a Result<AnalysisResult, AnalysisError>) -> Self {
        let (result, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            path: path.display().to_string(),
            result,
            error,
        }
    }
}
