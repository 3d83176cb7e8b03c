//! AWS Secrets Manager implementation.
//!
//! Lists secret metadata with `ListSecrets` and schedules deletions with
//! `DeleteSecret`. Uses AWS SDK for Rust with the standard credential chain
//! (environment, instance profile, etc.) and the SDK's standard retryer.

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_sdk_secretsmanager::{Client, types::SecretListEntry};
use aws_smithy_types::DateTime as SmithyDateTime;
use chrono::{DateTime, Utc};

use super::{PageSource, SecretDeleter, SecretError, SecretRecord, SecretResult};
use crate::config::AwsConfig;

/// AWS Secrets Manager backend.
#[derive(Clone)]
pub struct AwsSecretsManager {
    client: Client,
}

impl AwsSecretsManager {
    /// Create a new AWS Secrets Manager client with the given configuration.
    ///
    /// Loading the SDK config does not fail; missing credentials surface on the
    /// first request.
    pub async fn new(config: &AwsConfig) -> Self {
        let retry = RetryConfig::standard()
            .with_max_attempts(config.max_attempts)
            .with_max_backoff(config.max_backoff());

        let mut aws_config = aws_config::from_env().retry_config(retry);

        if let Some(region) = &config.region {
            aws_config = aws_config.region(aws_config::Region::new(region.clone()));
        }

        let aws_config = aws_config.load().await;

        let mut sm_config = aws_sdk_secretsmanager::config::Builder::from(&aws_config);

        if let Some(endpoint_url) = &config.endpoint_url {
            sm_config = sm_config.endpoint_url(endpoint_url);
        }

        let client = Client::from_conf(sm_config.build());

        Self { client }
    }

    /// Start a fresh listing of every secret in the account and region.
    pub fn list_pages(&self, page_size: u32) -> AwsSecretPages {
        AwsSecretPages {
            client: self.client.clone(),
            page_size: i32::try_from(page_size).unwrap_or(i32::MAX),
            next_token: None,
            first_page: true,
        }
    }
}

#[async_trait]
impl SecretDeleter for AwsSecretsManager {
    async fn delete(
        &self,
        identifier: &str,
        recovery_window_days: Option<u32>,
    ) -> SecretResult<()> {
        match self
            .client
            .delete_secret()
            .secret_id(identifier)
            .set_recovery_window_in_days(recovery_window_days.map(i64::from))
            .send()
            .await
        {
            Ok(output) => {
                tracing::debug!(
                    identifier,
                    deletion_date = ?output.deletion_date(),
                    "Secret scheduled for deletion"
                );
                Ok(())
            }
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_resource_not_found_exception() {
                    // Already deleted, not an error
                    tracing::debug!(identifier, "Secret already gone");
                    Ok(())
                } else {
                    Err(SecretError::Internal(format!(
                        "Failed to delete secret '{}': {}",
                        identifier, service_error
                    )))
                }
            }
        }
    }
}

/// `ListSecrets` pagination driven by `NextToken`.
///
/// The token only advances on success, so polling again after an error
/// re-requests the same page.
pub struct AwsSecretPages {
    client: Client,
    page_size: i32,
    next_token: Option<String>,
    first_page: bool,
}

#[async_trait]
impl PageSource for AwsSecretPages {
    fn has_more_pages(&self) -> bool {
        self.first_page || self.next_token.is_some()
    }

    async fn next_page(&mut self) -> SecretResult<Vec<SecretRecord>> {
        if !self.has_more_pages() {
            return Err(SecretError::Exhausted);
        }

        let output = self
            .client
            .list_secrets()
            .max_results(self.page_size)
            .set_next_token(self.next_token.clone())
            .send()
            .await
            .map_err(|e| {
                SecretError::Connection(format!(
                    "Failed to list secrets: {}",
                    e.into_service_error()
                ))
            })?;

        self.first_page = false;
        self.next_token = output
            .next_token()
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        Ok(output
            .secret_list()
            .iter()
            .filter_map(record_from_entry)
            .collect())
    }
}

/// Convert a listing entry into a record. Entries without an ARN cannot be
/// deleted and are dropped.
fn record_from_entry(entry: &SecretListEntry) -> Option<SecretRecord> {
    let Some(arn) = entry.arn() else {
        tracing::warn!(name = ?entry.name(), "Skipping secret without an ARN");
        return None;
    };

    let last_accessed_at = entry.last_accessed_date().and_then(to_chrono);

    Some(SecretRecord {
        identifier: arn.to_string(),
        display_name: entry.name().unwrap_or(arn).to_string(),
        last_accessed_at,
    })
}

fn to_chrono(timestamp: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}
