//! Deletion executor: one sequential, best-effort delete per flagged secret.

use super::FlaggedList;
use crate::{config::ScrubConfig, secrets::SecretDeleter};

/// What happened to one flagged secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// Scheduled for deletion within the recovery window.
    Deleted,
    /// The delete call failed; the message is the backend error.
    Failed(String),
    /// Dry run: no delete call was made.
    DryRun,
    /// Past `max_deletes_per_run`: no delete call was made.
    Skipped,
}

impl DeletionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionOutcome::Deleted => "deleted",
            DeletionOutcome::Failed(_) => "failed",
            DeletionOutcome::DryRun => "dry_run",
            DeletionOutcome::Skipped => "skipped",
        }
    }
}

/// Per-secret outcomes, aligned with the flagged list.
#[derive(Debug, Clone, Default)]
pub struct DeletionReport {
    pub outcomes: Vec<DeletionOutcome>,
}

impl DeletionReport {
    pub fn deleted(&self) -> u64 {
        self.count(|o| matches!(o, DeletionOutcome::Deleted))
    }

    pub fn failed(&self) -> u64 {
        self.count(|o| matches!(o, DeletionOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> u64 {
        self.count(|o| matches!(o, DeletionOutcome::Skipped))
    }

    fn count(&self, pred: impl Fn(&DeletionOutcome) -> bool) -> u64 {
        self.outcomes.iter().filter(|o| pred(o)).count() as u64
    }
}

/// Delete every flagged secret in list order.
///
/// Failures are logged and do not stop the loop. Nothing is retried here and
/// nothing is rolled back.
pub async fn delete_flagged<D>(
    deleter: &D,
    flagged: &FlaggedList,
    config: &ScrubConfig,
) -> DeletionReport
where
    D: SecretDeleter + ?Sized,
{
    let mut report = DeletionReport {
        outcomes: Vec::with_capacity(flagged.len()),
    };
    let limit = config.delete_limit();
    let mut attempted: u64 = 0;

    for secret in flagged {
        if config.dry_run {
            tracing::info!(
                identifier = %secret.identifier,
                secret = %secret.display_name,
                "DRY RUN: Would delete secret"
            );
            report.outcomes.push(DeletionOutcome::DryRun);
            continue;
        }

        if attempted >= limit {
            tracing::warn!(
                identifier = %secret.identifier,
                max_deletes_per_run = config.max_deletes_per_run,
                "Delete limit reached, skipping secret"
            );
            report.outcomes.push(DeletionOutcome::Skipped);
            continue;
        }

        attempted += 1;
        let outcome = match deleter
            .delete(&secret.identifier, Some(config.recovery_window_days))
            .await
        {
            Ok(()) => {
                tracing::info!(
                    identifier = %secret.identifier,
                    recovery_window_days = config.recovery_window_days,
                    "Deleted secret"
                );
                DeletionOutcome::Deleted
            }
            Err(e) => {
                tracing::error!(
                    identifier = %secret.identifier,
                    error = %e,
                    "Failed to delete secret"
                );
                DeletionOutcome::Failed(e.to_string())
            }
        };
        report.outcomes.push(outcome);
    }

    report
}
