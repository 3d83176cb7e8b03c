//! Audit report configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the CSV report of flagged secrets is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Report file path. Any existing file is overwritten.
    /// Default: /tmp/flagged.csv
    #[serde(default = "default_report_path")]
    pub path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: default_report_path(),
        }
    }
}

impl ReportConfig {
    pub(super) fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("report.path must not be empty".into());
        }
        Ok(())
    }
}

fn default_report_path() -> PathBuf {
    PathBuf::from("/tmp/flagged.csv")
}
