//! Slack Web API notifier.
//!
//! The summary goes out through `chat.postMessage` as a colored attachment.
//! The report uses the external upload flow: `files.getUploadURLExternal`,
//! a raw POST of the file bytes, then `files.completeUploadExternal`.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;

use super::{Notifier, NotifyError, NotifyResult, RunSummary};
use crate::config::SlackConfig;

const PRETEXT: &str = "Secrets Scrubber";
const COLOR: &str = "4af030";

/// Notifier posting to one Slack channel with a bot token.
pub struct SlackNotifier {
    client: reqwest::Client,
    token: String,
    channel: String,
    base_url: String,
}

/// Fields shared by the Web API responses this notifier reads.
#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    upload_url: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
}

impl SlackNotifier {
    pub fn new(config: &SlackConfig) -> NotifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            token: config.token.clone(),
            channel: config.channel.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Send an authenticated Web API request and check the `ok` flag.
    async fn call(
        &self,
        method: &'static str,
        request: reqwest::RequestBuilder,
    ) -> NotifyResult<SlackResponse> {
        let response = request
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?
            .error_for_status()?;

        let body: SlackResponse = response.json().await?;
        if !body.ok {
            return Err(NotifyError::Api {
                method,
                error: body.error.unwrap_or_else(|| "unknown_error".to_string()),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn post_summary(&self, summary: &RunSummary) -> NotifyResult<String> {
        let payload = json!({
            "channel": self.channel,
            "attachments": [{
                "pretext": PRETEXT,
                "text": summary.text(),
                "color": COLOR,
            }],
        });

        let response = self
            .call(
                "chat.postMessage",
                self.client
                    .post(self.method_url("chat.postMessage"))
                    .json(&payload),
            )
            .await?;

        let ts = response.ts.unwrap_or_default();
        tracing::info!(timestamp = %ts, channel = %self.channel, "Message sent successfully");
        Ok(ts)
    }

    async fn upload_report(&self, path: &Path, title: &str) -> NotifyResult<()> {
        let bytes = tokio::fs::read(path).await.map_err(|source| NotifyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.csv".to_string());

        let ticket = self
            .call(
                "files.getUploadURLExternal",
                self.client
                    .post(self.method_url("files.getUploadURLExternal"))
                    .form(&[
                        ("filename", filename.clone()),
                        ("length", bytes.len().to_string()),
                    ]),
            )
            .await?;

        let (Some(upload_url), Some(file_id)) = (ticket.upload_url, ticket.file_id) else {
            return Err(NotifyError::Api {
                method: "files.getUploadURLExternal",
                error: "response missing upload_url or file_id".to_string(),
            });
        };

        self.client
            .post(&upload_url)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;

        let files = json!([{ "id": &file_id, "title": title }]).to_string();
        self.call(
            "files.completeUploadExternal",
            self.client
                .post(self.method_url("files.completeUploadExternal"))
                .form(&[("files", files), ("channel_id", self.channel.clone())]),
        )
        .await?;

        tracing::info!(file_id = %file_id, filename = %filename, "Report uploaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, body_string, body_string_contains, header, method, path},
    };

    use super::*;

    fn notifier(server: &MockServer) -> SlackNotifier {
        SlackNotifier::new(&SlackConfig {
            token: "xoxb-test".into(),
            channel: "C123".into(),
            base_url: format!("{}/api/", server.uri()),
            upload_report: true,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_post_summary_sends_attachment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat.postMessage"))
            .and(header("authorization", "Bearer xoxb-test"))
            .and(body_partial_json(json!({
                "channel": "C123",
                "attachments": [{
                    "pretext": "Secrets Scrubber",
                    "text": "Deleted 2 secrets in secrets manager",
                    "color": "4af030",
                }],
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true, "channel": "C123", "ts": "1700000000.000100"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ts = notifier(&server)
            .post_summary(&RunSummary {
                deleted: 2,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(ts, "1700000000.000100");
    }

    #[tokio::test]
    async fn test_post_summary_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat.postMessage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": false, "error": "channel_not_found"})),
            )
            .mount(&server)
            .await;

        let err = notifier(&server)
            .post_summary(&RunSummary::default())
            .await
            .unwrap_err();

        match err {
            NotifyError::Api { method, error } => {
                assert_eq!(method, "chat.postMessage");
                assert_eq!(error, "channel_not_found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_post_summary_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat.postMessage"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = notifier(&server)
            .post_summary(&RunSummary::default())
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Http(_)));
    }

    #[tokio::test]
    async fn test_upload_report_external_flow() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("flagged.csv");
        std::fs::write(&report, "identifier\narn:a\n").unwrap();

        Mock::given(method("POST"))
            .and(path("/api/files.getUploadURLExternal"))
            .and(header("authorization", "Bearer xoxb-test"))
            .and(body_string_contains("filename=flagged.csv"))
            .and(body_string_contains("length=17"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "upload_url": format!("{}/upload/F123", server.uri()),
                "file_id": "F123",
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/upload/F123"))
            .and(body_string("identifier\narn:a\n"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK - 17"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/files.completeUploadExternal"))
            .and(body_string_contains("channel_id=C123"))
            .and(body_string_contains("DeletedSecrets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "files": []})))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server)
            .upload_report(&report, "DeletedSecrets")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_report_missing_file() {
        let server = MockServer::start().await;

        let err = notifier(&server)
            .upload_report(Path::new("/nonexistent/flagged.csv"), "DeletedSecrets")
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Io { .. }));
    }

    #[tokio::test]
    async fn test_upload_report_rejected_ticket() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("flagged.csv");
        std::fs::write(&report, "identifier\n").unwrap();

        Mock::given(method("POST"))
            .and(path("/api/files.getUploadURLExternal"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": false, "error": "missing_scope"})),
            )
            .mount(&server)
            .await;

        let err = notifier(&server)
            .upload_report(&report, "DeletedSecrets")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("missing_scope"));
    }
}
