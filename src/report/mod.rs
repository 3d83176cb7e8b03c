//! CSV audit report of flagged secrets.
//!
//! One row per flagged secret, in discovery order, with the outcome of its
//! delete call. Writing the report never fails the run: errors are logged and
//! surfaced as [`ReportStatus::Failed`].

use std::path::{Path, PathBuf};

use csv::Writer;
use thiserror::Error;

use crate::scrubber::{DeletionOutcome, FlaggedList};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report has {flagged} flagged secrets but {outcomes} deletion outcomes")]
    Mismatch { flagged: usize, outcomes: usize },
}

/// Outcome of writing the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStatus {
    Written { path: PathBuf, rows: usize },
    Failed(String),
}

impl ReportStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, ReportStatus::Written { .. })
    }

    /// Path of the written report, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ReportStatus::Written { path, .. } => Some(path),
            ReportStatus::Failed(_) => None,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Written { path, rows } => {
                write!(f, "file created successfully ({} rows at {})", rows, path.display())
            }
            ReportStatus::Failed(reason) => write!(f, "file not created: {}", reason),
        }
    }
}

#[derive(serde::Serialize)]
struct ReportRow<'a> {
    identifier: &'a str,
    name: &'a str,
    last_accessed_at: String,
    reason: &'static str,
    status: &'static str,
}

/// Write the report to `path`, overwriting any existing file.
pub fn write_report(
    path: &Path,
    flagged: &FlaggedList,
    outcomes: &[DeletionOutcome],
) -> ReportStatus {
    match try_write_report(path, flagged, outcomes) {
        Ok(rows) => {
            tracing::info!(path = %path.display(), rows, "Wrote flagged secrets report");
            ReportStatus::Written {
                path: path.to_path_buf(),
                rows,
            }
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to write flagged secrets report");
            ReportStatus::Failed(e.to_string())
        }
    }
}

fn try_write_report(
    path: &Path,
    flagged: &FlaggedList,
    outcomes: &[DeletionOutcome],
) -> Result<usize, ReportError> {
    if flagged.len() != outcomes.len() {
        return Err(ReportError::Mismatch {
            flagged: flagged.len(),
            outcomes: outcomes.len(),
        });
    }

    let mut wtr = Writer::from_path(path)?;

    // Header is written explicitly so an empty report still has one
    if flagged.is_empty() {
        wtr.write_record(["identifier", "name", "last_accessed_at", "reason", "status"])?;
    }

    for (secret, outcome) in flagged.iter().zip(outcomes) {
        wtr.serialize(ReportRow {
            identifier: &secret.identifier,
            name: &secret.display_name,
            last_accessed_at: secret
                .last_accessed_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            reason: secret.reason.as_str(),
            status: outcome.as_str(),
        })?;
    }

    wtr.flush()?;
    Ok(flagged.len())
}
