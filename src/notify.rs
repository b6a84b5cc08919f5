//! Notification sink: posts reports to a Misskey instance.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::NotifyError;

/// Anything that can publish a report as a post.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn create_post(&self, text: &str) -> Result<(), NotifyError>;
}

/// Misskey error codes that mean the token is missing, wrong or lacks scope.
const PERMISSION_CODES: &[&str] = &[
    "CREDENTIAL_REQUIRED",
    "AUTHENTICATION_FAILED",
    "PERMISSION_DENIED",
    "YOUR_ACCOUNT_SUSPENDED",
];

#[derive(Debug, Deserialize)]
struct MisskeyErrorBody {
    error: MisskeyError,
}

#[derive(Debug, Deserialize)]
struct MisskeyError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

pub struct MisskeyNotifier {
    client: Client,
    endpoint: String,
    access_token: String,
}

impl MisskeyNotifier {
    pub fn new(
        base_url: &str,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Other(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: notes_create_url(base_url),
            access_token: access_token.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// `https://` is assumed when the configured host has no scheme.
fn notes_create_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{}/api/notes/create", base)
    } else {
        format!("https://{}/api/notes/create", base)
    }
}

fn classify_transport(err: reqwest::Error) -> NotifyError {
    if err.is_connect() || err.is_timeout() {
        NotifyError::Connection(err.to_string())
    } else {
        NotifyError::classify_message(err.to_string())
    }
}

fn classify_response(status: StatusCode, body: &str) -> NotifyError {
    let parsed = serde_json::from_str::<MisskeyErrorBody>(body).ok();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let message = parsed
            .map(|b| b.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| status.to_string());
        return NotifyError::Permission(message);
    }

    match parsed {
        Some(MisskeyErrorBody { error }) if PERMISSION_CODES.contains(&error.code.as_str()) => {
            NotifyError::Permission(format!("{}: {}", error.code, error.message))
        }
        Some(MisskeyErrorBody { error }) => NotifyError::Rejected {
            status: status.as_u16(),
            message: format!("{}: {}", error.code, error.message),
        },
        // Nothing structured to go on.
        None => match NotifyError::classify_message(body) {
            NotifyError::Other(message) => NotifyError::Rejected {
                status: status.as_u16(),
                message,
            },
            classified => classified,
        },
    }
}

#[async_trait]
impl Notifier for MisskeyNotifier {
    async fn create_post(&self, text: &str) -> Result<(), NotifyError> {
        debug!("Posting {} bytes to {}", text.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "i": self.access_token, "text": text }))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status.is_success() {
            info!("已成功将提交信息和文件变化信息推送到Misskey");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_response(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(base: &str) -> MisskeyNotifier {
        MisskeyNotifier::new(base, "token123", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_adds_scheme_and_path() {
        assert_eq!(
            notes_create_url("misskey.example"),
            "https://misskey.example/api/notes/create"
        );
        assert_eq!(
            notes_create_url("http://127.0.0.1:3000/"),
            "http://127.0.0.1:3000/api/notes/create"
        );
    }

    #[tokio::test]
    async fn posts_token_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notes/create"))
            .and(body_partial_json(json!({"i": "token123", "text": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"createdNote": {}})))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server.uri()).create_post("hello").await.unwrap();
    }

    #[tokio::test]
    async fn unauthorized_is_permission_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"code": "CREDENTIAL_REQUIRED", "message": "Credential required."}
            })))
            .mount(&server)
            .await;

        let err = notifier(&server.uri()).create_post("x").await.unwrap_err();
        assert!(matches!(err, NotifyError::Permission(ref m) if m == "Credential required."));
    }

    #[tokio::test]
    async fn permission_code_in_body_is_permission_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": "PERMISSION_DENIED", "message": "Your app does not have the necessary permissions."}
            })))
            .mount(&server)
            .await;

        let err = notifier(&server.uri()).create_post("x").await.unwrap_err();
        assert!(matches!(err, NotifyError::Permission(_)));
    }

    #[tokio::test]
    async fn other_api_errors_are_rejections() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": "INVALID_PARAM", "message": "Invalid param."}
            })))
            .mount(&server)
            .await;

        let err = notifier(&server.uri()).create_post("x").await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_error() {
        // Port 1 on loopback refuses connections.
        let err = notifier("http://127.0.0.1:1").create_post("x").await.unwrap_err();
        assert!(matches!(err, NotifyError::Connection(_)), "{err:?}");
    }

    #[test]
    fn opaque_body_falls_back_to_wording() {
        let err = classify_response(StatusCode::BAD_GATEWAY, "upstream network failure");
        assert!(matches!(err, NotifyError::Connection(_)));

        let err = classify_response(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert!(matches!(err, NotifyError::Rejected { status: 500, .. }));
    }
}
