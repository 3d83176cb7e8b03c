//! Flagging and deletion configuration.
//!
//! The retention threshold itself (two years) is fixed and not configurable.
//!
//! # Example
//!
//! ```toml
//! [scrub]
//! recovery_window_days = 7
//! page_size = 100
//! page_error_policy = "continue"
//! max_page_errors = 5
//! dry_run = false
//! max_deletes_per_run = 0
//! ```

use serde::{Deserialize, Serialize};

/// Smallest recovery window accepted by Secrets Manager.
pub const MIN_RECOVERY_WINDOW_DAYS: u32 = 7;
/// Largest recovery window accepted by Secrets Manager.
pub const MAX_RECOVERY_WINDOW_DAYS: u32 = 30;
/// Largest page size accepted by `ListSecrets`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Scrub job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrubConfig {
    /// Days the backend keeps a deleted secret recoverable.
    /// Default: 7
    #[serde(default = "default_recovery_window_days")]
    pub recovery_window_days: u32,

    /// Number of secrets requested per listing page.
    /// Default: 100
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// What to do when fetching a page fails.
    #[serde(default)]
    pub page_error_policy: PageErrorPolicy,

    /// Stop scanning after this many page-fetch failures in a row.
    /// A successful page resets the count. Set to 0 for no limit.
    /// Default: 5
    #[serde(default = "default_max_page_errors")]
    pub max_page_errors: u32,

    /// If true, flag and report without deleting anything.
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,

    /// Maximum number of secrets deleted per run (0 = unlimited).
    /// Flagged secrets past the limit are reported as skipped.
    /// Default: 0
    #[serde(default)]
    pub max_deletes_per_run: u64,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            recovery_window_days: default_recovery_window_days(),
            page_size: default_page_size(),
            page_error_policy: PageErrorPolicy::default(),
            max_page_errors: default_max_page_errors(),
            dry_run: false,
            max_deletes_per_run: 0,
        }
    }
}

impl ScrubConfig {
    /// Effective delete limit, with 0 meaning unlimited.
    pub fn delete_limit(&self) -> u64 {
        if self.max_deletes_per_run == 0 {
            u64::MAX
        } else {
            self.max_deletes_per_run
        }
    }

    /// Effective limit on consecutive page errors, with 0 meaning unlimited.
    pub fn page_error_limit(&self) -> u32 {
        if self.max_page_errors == 0 {
            u32::MAX
        } else {
            self.max_page_errors
        }
    }

    pub(super) fn validate(&self) -> Result<(), String> {
        if !(MIN_RECOVERY_WINDOW_DAYS..=MAX_RECOVERY_WINDOW_DAYS)
            .contains(&self.recovery_window_days)
        {
            return Err(format!(
                "scrub.recovery_window_days must be between {} and {}, got {}",
                MIN_RECOVERY_WINDOW_DAYS, MAX_RECOVERY_WINDOW_DAYS, self.recovery_window_days
            ));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(format!(
                "scrub.page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            ));
        }
        Ok(())
    }
}

fn default_recovery_window_days() -> u32 {
    7
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_max_page_errors() -> u32 {
    5
}

/// Behavior when a listing page cannot be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageErrorPolicy {
    /// Log the failure and poll the page source again.
    #[default]
    Continue,
    /// Stop the run, returning what was flagged so far. Nothing is deleted.
    Abort,
}
