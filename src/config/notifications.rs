//! Notification configuration.
//!
//! # Example
//!
//! ```toml
//! [notifications.slack]
//! token = "${SLACK_BOT_TOKEN}"
//! channel = "C0123456789"
//! upload_report = true
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Notification channels for the run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Slack Web API settings.
    pub slack: SlackConfig,
}

impl NotificationsConfig {
    pub(super) fn validate(&self) -> Result<(), String> {
        self.slack.validate()
    }
}

/// Slack Web API configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`) with `chat:write` and `files:write` scopes.
    pub token: String,

    /// Channel ID the summary and report are posted to.
    pub channel: String,

    /// Slack Web API base URL.
    /// Default: https://slack.com/api
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Attach the CSV report to the channel after the summary message.
    /// Default: true
    #[serde(default = "default_true")]
    pub upload_report: bool,

    /// Per-request timeout (in seconds).
    /// Default: 30
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SlackConfig {
    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("notifications.slack.token must be set".into());
        }
        if self.channel.trim().is_empty() {
            return Err("notifications.slack.channel must be set".into());
        }
        if self.base_url.trim().is_empty() {
            return Err("notifications.slack.base_url must not be empty".into());
        }
        if self.timeout_secs == 0 {
            return Err("notifications.slack.timeout_secs must be at least 1".into());
        }
        Ok(())
    }
}

// Custom Debug so the bot token never reaches the logs
impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &"****")
            .field("channel", &self.channel)
            .field("base_url", &self.base_url)
            .field("upload_report", &self.upload_report)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slack() -> SlackConfig {
        SlackConfig {
            token: "xoxb-test".into(),
            channel: "C123".into(),
            base_url: default_base_url(),
            upload_report: true,
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", slack());
        assert!(!debug.contains("xoxb-test"));
        assert!(debug.contains("C123"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = SlackConfig {
            timeout_secs: 0,
            ..slack()
        };
        assert!(config.validate().is_err());
    }
}
