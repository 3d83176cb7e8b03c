//! Configuration module for the secret scrubber.
//!
//! The job is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [aws]
//! region = "us-east-1"
//!
//! [notifications.slack]
//! token = "${SLACK_BOT_TOKEN}"
//! channel = "C0123456789"
//! ```

mod aws;
mod notifications;
mod observability;
mod report;
mod scrub;

use std::path::Path;

pub use aws::*;
pub use notifications::*;
pub use observability::*;
pub use report::*;
pub use scrub::*;
use serde::{Deserialize, Serialize};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "secret-scrubber.toml";

/// Root configuration for the secret scrubber.
///
/// Every section except `notifications` has defaults. The Slack token and
/// channel must be supplied; there is no sensible fallback destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrubberConfig {
    /// AWS client configuration (region, endpoint, retry policy).
    #[serde(default)]
    pub aws: AwsConfig,

    /// Flagging and deletion behavior.
    #[serde(default)]
    pub scrub: ScrubConfig,

    /// Where the audit report is written.
    #[serde(default)]
    pub report: ReportConfig,

    /// Notification channels.
    pub notifications: NotificationsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl ScrubberConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: ScrubberConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&self) -> Result<(), ConfigError> {
        self.aws.validate().map_err(ConfigError::Validation)?;
        self.scrub.validate().map_err(ConfigError::Validation)?;
        self.report.validate().map_err(ConfigError::Validation)?;
        self.notifications
            .validate()
            .map_err(ConfigError::Validation)?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Invalid env var pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Expand environment variables in the format `${VAR_NAME}`.
/// Skips commented lines (lines where content before the variable is a comment).
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")?;
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let Some(whole) = cap.get(0) else {
                continue;
            };

            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            line_result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = whole.end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    // Remove trailing newline if input didn't have one
    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}

/// Commented configuration written by `secret-scrubber init`.
pub fn default_config_toml() -> &'static str {
    r#"# Secret Scrubber Configuration
#
# Secrets that have not been accessed for two years (or never) are deleted
# with a recovery window, written to a CSV report and announced on Slack.

[aws]
# region = "us-east-1"
# endpoint_url = "http://localhost:4566"
max_attempts = 10
max_backoff_secs = 10

[scrub]
recovery_window_days = 7
page_size = 100
page_error_policy = "continue"
max_page_errors = 5
dry_run = true
max_deletes_per_run = 0

[report]
path = "/tmp/flagged.csv"

[notifications.slack]
token = "${SLACK_BOT_TOKEN}"
channel = "${SLACK_CHANNEL_ID}"
upload_report = true

[observability.logging]
level = "info"
format = "compact"
"#
}
