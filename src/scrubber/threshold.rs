//! Retention threshold: the cutoff separating stale secrets from live ones.

use chrono::{DateTime, Datelike, Days, Months, Utc};

/// How long a secret may go unread before it is flagged.
pub const RETENTION_PERIOD_MONTHS: u32 = 24;

/// A fixed point in time computed once per run.
///
/// Every record in a run is judged against the same instant, however long
/// pagination takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionThreshold(DateTime<Utc>);

impl RetentionThreshold {
    /// Threshold for a run starting at `now`: two years earlier.
    ///
    /// A day that does not exist in the target month rolls over into the next
    /// month, so Feb 29 maps to Mar 1 two years back.
    pub fn from_now(now: DateTime<Utc>) -> Self {
        let cutoff = now
            .checked_sub_months(Months::new(RETENTION_PERIOD_MONTHS))
            .and_then(|clamped| {
                // chrono clamps to the last day of the month; add back the overflow
                let overflow = now.day().saturating_sub(clamped.day());
                clamped.checked_add_days(Days::new(u64::from(overflow)))
            })
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self(cutoff)
    }

    /// Threshold at an explicit instant.
    pub fn at(cutoff: DateTime<Utc>) -> Self {
        Self(cutoff)
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.0
    }

    /// Whether a secret last accessed at `last_accessed_at` should be flagged.
    ///
    /// Never-accessed secrets are always stale, even if they were created
    /// moments ago.
    pub fn is_stale(&self, last_accessed_at: Option<DateTime<Utc>>) -> bool {
        match last_accessed_at {
            Some(accessed) => accessed < self.0,
            None => true,
        }
    }
}

impl std::fmt::Display for RetentionThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
