//! Webhook handler for GitHub deliveries

use axum::{
    Json,
    body::Bytes,
    extract::State as AxumState,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::SharedState;
use crate::dispatch::dispatch;
use crate::error::WebhookError;
use crate::signature::verify_github_signature;
use crate::webhook::EventKind;

/// GitHub caps webhook payloads at 25 MB.
pub const MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Handles `POST /github-webhook`.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = EventKind::parse(header(&headers, "X-GitHub-Event"));
    let delivery = header(&headers, "X-GitHub-Delivery")
        .map(String::from)
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let span = info_span!("delivery", id = %delivery, event = event.as_str());
    async move {
        match process(&state, &event, &headers, &body).await {
            Ok(()) => (StatusCode::OK, Json(json!({"status": "success"}))).into_response(),
            Err(e) => e.into_response(),
        }
    }
    .instrument(span)
    .await
}

/// Any other method on the webhook route.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({"status": "method not allowed"})),
    )
}

async fn process(
    state: &SharedState,
    event: &EventKind,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<(), WebhookError> {
    if let Some(secret) = &state.webhook_secret {
        let signature = header(headers, "X-Hub-Signature-256").ok_or_else(|| {
            WebhookError::InvalidSignature("missing X-Hub-Signature-256 header".to_string())
        })?;
        if !verify_github_signature(secret, body, signature) {
            return Err(WebhookError::InvalidSignature(
                "signature does not match payload".to_string(),
            ));
        }
    }

    let payload: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| WebhookError::InvalidJson(format!("无法将请求体解析为JSON格式: {}", e)))?;
    if payload.is_null() {
        return Err(WebhookError::InvalidJson(
            "无法将请求体解析为JSON格式: body is null".to_string(),
        ));
    }

    info!("接收到的GitHub事件类型: {}", event.as_str());
    dispatch(state, event, payload).await
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
