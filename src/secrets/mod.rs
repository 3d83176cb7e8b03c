//! Secret listing and deletion backends.
//!
//! The scrubber consumes two seams:
//! - [`PageSource`]: pages of secret metadata, polled until exhausted
//! - [`SecretDeleter`]: delete-by-identifier with an optional recovery window
//!
//! Backends:
//! - AWS Secrets Manager (production)
//! - In-memory (for testing)

mod aws;
mod memory;

use async_trait::async_trait;
pub use aws::{AwsSecretPages, AwsSecretsManager};
use chrono::{DateTime, Utc};
pub use memory::{MemoryPageSource, MemorySecretStore};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("No more pages available")]
    Exhausted,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SecretResult<T> = Result<T, SecretError>;

/// Metadata for one secret, as returned by a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    /// Opaque unique reference used for deletion (an ARN on AWS).
    pub identifier: String,
    /// Human-readable name, used for logging.
    pub display_name: String,
    /// Last time the secret was read. `None` means it was never accessed.
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl SecretRecord {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        last_accessed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            last_accessed_at,
        }
    }
}

/// Page-by-page listing of secret metadata.
///
/// Callers poll [`next_page`](PageSource::next_page) while
/// [`has_more_pages`](PageSource::has_more_pages) returns true. A failed fetch
/// leaves the source's position to the implementation; the AWS source retries
/// the same page on the next poll.
#[async_trait]
pub trait PageSource: Send {
    /// Whether another call to `next_page` may return records.
    fn has_more_pages(&self) -> bool;

    /// Fetch the next page of records.
    async fn next_page(&mut self) -> SecretResult<Vec<SecretRecord>>;
}

/// Delete-by-identifier operation.
#[async_trait]
pub trait SecretDeleter: Send + Sync {
    /// Schedule a secret for deletion.
    ///
    /// With `Some(days)` the backend keeps the secret recoverable for that many
    /// days; with `None` the backend's default window applies.
    async fn delete(
        &self,
        identifier: &str,
        recovery_window_days: Option<u32>,
    ) -> SecretResult<()>;
}
