//! Run summary notifications.
//!
//! Posting the summary and uploading the report are separate operations with
//! separate error channels: callers treat a failed post as fatal and a failed
//! upload as best-effort.

mod slack;

use std::path::Path;

use async_trait::async_trait;
pub use slack::SlackNotifier;
use thiserror::Error;

/// Title given to the uploaded report.
pub const REPORT_TITLE: &str = "DeletedSecrets";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack API error in {method}: {error}")]
    Api { method: &'static str, error: String },

    #[error("Failed to read report {}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Counts announced at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub deleted: u64,
    pub failed: u64,
    /// Set on dry runs: the number of secrets that would have been deleted.
    pub would_delete: Option<u64>,
    /// Page fetches that failed during the scan.
    pub page_errors: u32,
    /// The scan stopped before the listing was exhausted.
    pub truncated: bool,
}

impl RunSummary {
    /// Message text for the summary.
    pub fn text(&self) -> String {
        let mut text = match self.would_delete {
            Some(count) => format!("Dry run: would delete {} secrets in secrets manager", count),
            None => {
                let mut text = format!("Deleted {} secrets in secrets manager", self.deleted);
                if self.failed > 0 {
                    text.push_str(&format!(" ({} failed)", self.failed));
                }
                text
            }
        };

        if self.truncated {
            text.push_str(&format!(
                " (scan incomplete: {} page errors)",
                self.page_errors
            ));
        } else if self.page_errors > 0 {
            text.push_str(&format!(" ({} page errors)", self.page_errors));
        }
        text
    }
}

/// Destination for the run summary and report.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post the summary message. Returns the message timestamp.
    async fn post_summary(&self, summary: &RunSummary) -> NotifyResult<String>;

    /// Attach the report file to the channel under `title`.
    async fn upload_report(&self, path: &Path, title: &str) -> NotifyResult<()>;
}
