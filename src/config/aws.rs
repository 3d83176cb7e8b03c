//! AWS client configuration.
//!
//! Credentials are always resolved through the standard provider chain
//! (environment, profile, instance metadata). Only the region, endpoint and
//! retry policy are configurable here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// AWS Secrets Manager client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwsConfig {
    /// AWS region (e.g., "us-east-1"). Falls back to the default region chain.
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint URL (useful for localstack testing).
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Maximum attempts per call for the SDK standard retryer.
    /// Default: 10
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Maximum backoff between retries (in seconds).
    /// Default: 10
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            max_attempts: default_max_attempts(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

impl AwsConfig {
    /// Get the maximum retry backoff as a Duration.
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    pub(super) fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("aws.max_attempts must be at least 1".into());
        }
        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            return Err("aws.region must not be empty when set".into());
        }
        Ok(())
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_max_backoff_secs() -> u64 {
    10
}
