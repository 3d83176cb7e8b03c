//! End-to-end tests for the scrub pipeline.
//!
//! Secrets come from the in-memory backend; Slack is served by wiremock.
