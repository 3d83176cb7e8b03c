//! Secret scrubbing pipeline.
//!
//! A single run is strictly linear:
//! 1. Compute the retention threshold (now minus two years), once
//! 2. Drain the page source, flagging stale and never-accessed secrets
//! 3. Delete each flagged secret with a recovery window, best-effort
//! 4. Write the CSV audit report
//! 5. Post the summary message, then upload the report
//!
//! Only a failed summary post (or a page error under the `abort` policy)
//! fails the run. Everything else is logged and the run continues.

mod deletion;
mod flagging;
mod job;
mod threshold;

pub use deletion::{DeletionOutcome, DeletionReport, delete_flagged};
pub use flagging::{
    FlagReason, FlaggedList, FlaggedSecret, ScanResult, flag_record, flag_stale_secrets,
};
pub use job::{ScrubRunResult, run_scrub};
use thiserror::Error;
pub use threshold::{RETENTION_PERIOD_MONTHS, RetentionThreshold};

use crate::{notify::NotifyError, secrets::SecretError};

#[derive(Debug, Error)]
pub enum ScrubError {
    #[error("Failed to fetch secrets page ({} secrets flagged before abort): {source}", .flagged.len())]
    PageFetch {
        flagged: FlaggedList,
        source: SecretError,
    },

    #[error("Failed to post summary notification: {0}")]
    Notify(#[from] NotifyError),
}
