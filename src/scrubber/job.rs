//! One end-to-end scrub run.

use std::time::Instant;

use chrono::Utc;

use super::{RetentionThreshold, ScrubError, delete_flagged, flag_stale_secrets};
use crate::{
    config::ScrubberConfig,
    notify::{Notifier, REPORT_TITLE, RunSummary},
    report::{ReportStatus, write_report},
    secrets::{PageSource, SecretDeleter},
};

/// Results from a single scrub run.
#[derive(Debug)]
pub struct ScrubRunResult {
    /// Records examined across all pages.
    pub scanned: u64,
    /// Secrets flagged for deletion.
    pub flagged: u64,
    /// Secrets scheduled for deletion.
    pub deleted: u64,
    /// Delete calls that failed.
    pub failed: u64,
    /// Flagged secrets past the per-run delete limit.
    pub skipped: u64,
    /// Page fetches that failed.
    pub page_errors: u32,
    /// The scan stopped early after too many page errors in a row, so some
    /// secrets were never examined.
    pub truncated: bool,
    /// Outcome of writing the CSV report.
    pub report: ReportStatus,
    /// Timestamp of the posted summary message.
    pub message_ts: String,
    /// Whether the report reached the channel.
    pub report_uploaded: bool,
    pub dry_run: bool,
    /// Duration of the run in milliseconds.
    pub duration_ms: u64,
}

/// Run the full pipeline once.
pub async fn run_scrub<P, D, N>(
    pages: &mut P,
    deleter: &D,
    notifier: &N,
    config: &ScrubberConfig,
) -> Result<ScrubRunResult, ScrubError>
where
    P: PageSource + ?Sized,
    D: SecretDeleter + ?Sized,
    N: Notifier + ?Sized,
{
    let start = Instant::now();
    let scrub = &config.scrub;
    let dry_run_msg = if scrub.dry_run { " (DRY RUN)" } else { "" };

    let threshold = RetentionThreshold::from_now(Utc::now());
    tracing::info!(
        threshold = %threshold,
        recovery_window_days = scrub.recovery_window_days,
        dry_run = scrub.dry_run,
        "Starting secret scrub{}",
        dry_run_msg
    );

    let scan = flag_stale_secrets(pages, &threshold, scrub).await?;
    tracing::info!(
        scanned = scan.scanned,
        flagged = scan.flagged.len(),
        page_errors = scan.page_errors,
        truncated = scan.truncated,
        "Finished scanning secrets"
    );
    if scan.truncated {
        tracing::warn!(
            page_errors = scan.page_errors,
            "Scan incomplete, secrets on unread pages were not evaluated"
        );
    }

    let deletions = delete_flagged(deleter, &scan.flagged, scrub).await;
    let report = write_report(&config.report.path, &scan.flagged, &deletions.outcomes);

    let summary = if scrub.dry_run {
        RunSummary {
            would_delete: Some(scan.flagged.len() as u64),
            page_errors: scan.page_errors,
            truncated: scan.truncated,
            ..Default::default()
        }
    } else {
        RunSummary {
            deleted: deletions.deleted(),
            failed: deletions.failed(),
            would_delete: None,
            page_errors: scan.page_errors,
            truncated: scan.truncated,
        }
    };

    let message_ts = notifier.post_summary(&summary).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to post summary message");
        ScrubError::Notify(e)
    })?;

    let report_uploaded = match report.path() {
        Some(path) if config.notifications.slack.upload_report => {
            match notifier.upload_report(path, REPORT_TITLE).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to upload report");
                    false
                }
            }
        }
        Some(_) => false,
        None => {
            tracing::warn!(report = %report, "Skipping report upload");
            false
        }
    };

    let result = ScrubRunResult {
        scanned: scan.scanned,
        flagged: scan.flagged.len() as u64,
        deleted: deletions.deleted(),
        failed: deletions.failed(),
        skipped: deletions.skipped(),
        page_errors: scan.page_errors,
        truncated: scan.truncated,
        report,
        message_ts,
        report_uploaded,
        dry_run: scrub.dry_run,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    tracing::info!(
        scanned = result.scanned,
        flagged = result.flagged,
        deleted = result.deleted,
        failed = result.failed,
        skipped = result.skipped,
        page_errors = result.page_errors,
        truncated = result.truncated,
        report = %result.report,
        report_uploaded = result.report_uploaded,
        duration_ms = result.duration_ms,
        "Secret scrub complete{}",
        dry_run_msg
    );

    Ok(result)
}
