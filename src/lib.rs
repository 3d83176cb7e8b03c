//! Secret scrubber: deletes secrets that have gone unused for two years.
//!
//! The job lists every secret in AWS Secrets Manager, flags those last
//! accessed before the retention threshold (or never accessed), schedules
//! them for deletion with a recovery window, writes a CSV audit report and
//! announces the result on Slack.

pub mod config;
pub mod notify;
pub mod observability;
pub mod report;
pub mod scrubber;
pub mod secrets;

#[cfg(test)]
mod tests;
