//! Flagging filter: selects stale secrets from a page source.

use chrono::{DateTime, Utc};

use super::{RetentionThreshold, ScrubError};
use crate::{
    config::{PageErrorPolicy, ScrubConfig},
    secrets::{PageSource, SecretRecord},
};

/// Why a secret was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagReason {
    /// Last accessed before the retention threshold.
    Stale,
    /// No access was ever recorded.
    NeverAccessed,
}

impl FlagReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagReason::Stale => "stale",
            FlagReason::NeverAccessed => "never_accessed",
        }
    }
}

/// A secret selected for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedSecret {
    pub identifier: String,
    pub display_name: String,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub reason: FlagReason,
}

/// Flagged secrets in discovery order.
///
/// No deduplication: a listing returns each identifier once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlaggedList(Vec<FlaggedSecret>);

impl FlaggedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, secret: FlaggedSecret) {
        self.0.push(secret);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlaggedSecret> {
        self.0.iter()
    }

    /// Identifiers in discovery order.
    pub fn identifiers(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.identifier.as_str()).collect()
    }
}

impl From<Vec<FlaggedSecret>> for FlaggedList {
    fn from(secrets: Vec<FlaggedSecret>) -> Self {
        Self(secrets)
    }
}

impl<'a> IntoIterator for &'a FlaggedList {
    type Item = &'a FlaggedSecret;
    type IntoIter = std::slice::Iter<'a, FlaggedSecret>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of draining a page source.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub flagged: FlaggedList,
    /// Records examined across all pages.
    pub scanned: u64,
    /// Page fetches that failed.
    pub page_errors: u32,
    /// True if the scan stopped early after too many page errors in a row.
    pub truncated: bool,
}

/// Apply the staleness predicate to one record, logging every hit.
pub fn flag_record(threshold: &RetentionThreshold, record: &SecretRecord) -> Option<FlaggedSecret> {
    if !threshold.is_stale(record.last_accessed_at) {
        return None;
    }

    let reason = match record.last_accessed_at {
        Some(accessed) => {
            tracing::info!(
                secret = %record.display_name,
                last_accessed_at = %accessed.to_rfc3339(),
                "Flagged secret not accessed since before the retention threshold"
            );
            FlagReason::Stale
        }
        None => {
            // TODO: skip secrets created after the threshold once the listing carries creation dates
            tracing::info!(
                secret = %record.display_name,
                "{} has not been accessed at all",
                record.display_name
            );
            FlagReason::NeverAccessed
        }
    };

    Some(FlaggedSecret {
        identifier: record.identifier.clone(),
        display_name: record.display_name.clone(),
        last_accessed_at: record.last_accessed_at,
        reason,
    })
}

/// Poll `source` until exhausted and collect every stale secret.
///
/// Page-fetch failures follow `config.page_error_policy`: `Continue` logs the
/// failure and polls again, `Abort` returns [`ScrubError::PageFetch`] with
/// the secrets flagged so far. Under `Continue` the scan stops once
/// `config.max_page_errors` fetches in a row have failed; a successful page
/// resets the count.
pub async fn flag_stale_secrets<P>(
    source: &mut P,
    threshold: &RetentionThreshold,
    config: &ScrubConfig,
) -> Result<ScanResult, ScrubError>
where
    P: PageSource + ?Sized,
{
    let mut result = ScanResult::default();
    let error_limit = config.page_error_limit();
    let mut consecutive_errors: u32 = 0;

    while source.has_more_pages() {
        let records = match source.next_page().await {
            Ok(records) => {
                consecutive_errors = 0;
                records
            }
            Err(e) => {
                result.page_errors += 1;
                consecutive_errors += 1;
                tracing::error!(
                    error = %e,
                    page_errors = result.page_errors,
                    consecutive_errors,
                    "Failed to fetch secrets page"
                );

                if config.page_error_policy == PageErrorPolicy::Abort {
                    return Err(ScrubError::PageFetch {
                        flagged: result.flagged,
                        source: e,
                    });
                }
                if consecutive_errors >= error_limit {
                    tracing::error!(
                        page_errors = result.page_errors,
                        consecutive_errors,
                        flagged = result.flagged.len(),
                        "Too many page fetch errors, stopping scan with partial results"
                    );
                    result.truncated = true;
                    break;
                }
                continue;
            }
        };

        for record in &records {
            result.scanned += 1;
            if let Some(flagged) = flag_record(threshold, record) {
                result.flagged.push(flagged);
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tracing::Level;

    use super::*;
    use crate::{
        observability::capture::capture_logs,
        secrets::{MemoryPageSource, SecretError},
    };

    fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn threshold() -> RetentionThreshold {
        RetentionThreshold::at(ymd(2023, 1, 1))
    }

    fn record(id: &str, accessed: Option<DateTime<Utc>>) -> SecretRecord {
        SecretRecord::new(id, format!("{id}-name"), accessed)
    }

    fn scenario_records() -> Vec<SecretRecord> {
        vec![
            record("A", Some(ymd(2020, 1, 1))),
            record("B", Some(ymd(2024, 1, 1))),
            record("C", None),
        ]
    }

    #[tokio::test]
    async fn test_flags_stale_and_never_accessed_in_order() {
        let mut source = MemoryPageSource::from_pages(vec![scenario_records()]);

        let result = flag_stale_secrets(&mut source, &threshold(), &ScrubConfig::default())
            .await
            .unwrap();

        assert_eq!(result.flagged.identifiers(), vec!["A", "C"]);
        assert_eq!(result.scanned, 3);
        assert_eq!(result.page_errors, 0);
        assert!(!result.truncated);

        let reasons: Vec<_> = result.flagged.iter().map(|s| s.reason).collect();
        assert_eq!(reasons, vec![FlagReason::Stale, FlagReason::NeverAccessed]);
    }

    #[tokio::test]
    async fn test_preserves_discovery_order_across_pages() {
        let mut source = MemoryPageSource::from_pages(vec![
            vec![record("p1-a", None), record("p1-b", Some(ymd(2021, 3, 1)))],
            vec![record("p2-a", Some(ymd(2025, 1, 1)))],
            vec![record("p3-a", Some(ymd(2019, 7, 4))), record("p3-b", None)],
        ]);

        let result = flag_stale_secrets(&mut source, &threshold(), &ScrubConfig::default())
            .await
            .unwrap();

        assert_eq!(
            result.flagged.identifiers(),
            vec!["p1-a", "p1-b", "p3-a", "p3-b"]
        );
        assert_eq!(result.scanned, 5);
    }

    #[tokio::test]
    async fn test_empty_source_yields_empty_list() {
        let mut source = MemoryPageSource::empty();

        let result = flag_stale_secrets(&mut source, &threshold(), &ScrubConfig::default())
            .await
            .unwrap();

        assert!(result.flagged.is_empty());
        assert_eq!(result.scanned, 0);
    }

    #[tokio::test]
    async fn test_page_error_does_not_stop_later_pages() {
        let mut source = MemoryPageSource::new(vec![
            Ok(vec![record("page1", None)]),
            Err(SecretError::Connection("throttled".into())),
            Ok(vec![record("page3", None)]),
        ]);

        let result = flag_stale_secrets(&mut source, &threshold(), &ScrubConfig::default())
            .await
            .unwrap();

        assert_eq!(result.flagged.identifiers(), vec!["page1", "page3"]);
        assert_eq!(result.page_errors, 1);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn test_abort_policy_returns_partial_results() {
        let mut source = MemoryPageSource::new(vec![
            Ok(vec![record("page1", None)]),
            Err(SecretError::Connection("access denied".into())),
            Ok(vec![record("page3", None)]),
        ]);
        let config = ScrubConfig {
            page_error_policy: PageErrorPolicy::Abort,
            ..Default::default()
        };

        let err = flag_stale_secrets(&mut source, &threshold(), &config)
            .await
            .unwrap_err();

        match err {
            ScrubError::PageFetch { flagged, source } => {
                assert_eq!(flagged.identifiers(), vec!["page1"]);
                assert!(source.to_string().contains("access denied"));
            }
            other => panic!("expected PageFetch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_page_error_limit_truncates_scan() {
        let mut source = MemoryPageSource::new(vec![
            Ok(vec![record("page1", None)]),
            Err(SecretError::Connection("one".into())),
            Err(SecretError::Connection("two".into())),
            Ok(vec![record("page4", None)]),
        ]);
        let config = ScrubConfig {
            max_page_errors: 2,
            ..Default::default()
        };

        let result = flag_stale_secrets(&mut source, &threshold(), &config)
            .await
            .unwrap();

        assert_eq!(result.flagged.identifiers(), vec!["page1"]);
        assert_eq!(result.page_errors, 2);
        assert!(result.truncated);
    }

    #[tokio::test]
    async fn test_successful_page_resets_error_limit() {
        let mut source = MemoryPageSource::new(vec![
            Err(SecretError::Connection("one".into())),
            Ok(vec![record("page2", None)]),
            Err(SecretError::Connection("two".into())),
            Ok(vec![record("page4", None)]),
            Err(SecretError::Connection("three".into())),
            Ok(vec![record("page6", None)]),
        ]);
        let config = ScrubConfig {
            max_page_errors: 2,
            ..Default::default()
        };

        let result = flag_stale_secrets(&mut source, &threshold(), &config)
            .await
            .unwrap();

        assert_eq!(result.flagged.identifiers(), vec!["page2", "page4", "page6"]);
        assert_eq!(result.page_errors, 3);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn test_same_input_yields_same_output() {
        let pages = vec![scenario_records(), vec![record("D", None)]];

        let mut first = MemoryPageSource::from_pages(pages.clone());
        let mut second = MemoryPageSource::from_pages(pages);
        let config = ScrubConfig::default();

        let a = flag_stale_secrets(&mut first, &threshold(), &config)
            .await
            .unwrap();
        let b = flag_stale_secrets(&mut second, &threshold(), &config)
            .await
            .unwrap();

        assert_eq!(a.flagged, b.flagged);
    }

    #[tokio::test]
    async fn test_logs_display_name_of_every_flagged_secret() {
        let (logs, _guard) = capture_logs();
        let mut source = MemoryPageSource::from_pages(vec![scenario_records()]);

        flag_stale_secrets(&mut source, &threshold(), &ScrubConfig::default())
            .await
            .unwrap();

        let flagged_names: Vec<String> = logs
            .at_level(Level::INFO)
            .iter()
            .filter_map(|e| e.field("secret").map(str::to_string))
            .collect();
        assert_eq!(flagged_names, vec!["A-name", "C-name"]);

        let never_accessed = logs
            .events()
            .into_iter()
            .find(|e| e.field("secret") == Some("C-name"))
            .unwrap();
        assert_eq!(never_accessed.message, "C-name has not been accessed at all");
    }

    #[tokio::test]
    async fn test_page_error_is_logged() {
        let (logs, _guard) = capture_logs();
        let mut source = MemoryPageSource::new(vec![Err(SecretError::Connection(
            "throttled".into(),
        ))]);

        flag_stale_secrets(&mut source, &threshold(), &ScrubConfig::default())
            .await
            .unwrap();

        let errors = logs.at_level(Level::ERROR);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].field("error").unwrap().contains("throttled"));
    }
}
