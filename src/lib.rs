pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod notify;
pub mod persist;
pub mod report;
pub mod schema;
pub mod signature;
pub mod webhook;

use axum::{Router, extract::DefaultBodyLimit, routing};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::NotifyError;
use crate::notify::{MisskeyNotifier, Notifier};
use crate::persist::{FileSink, PushSink};

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    pub notifier: Arc<dyn Notifier>,
    pub push_sink: Arc<dyn PushSink>,
    pub webhook_secret: Option<String>,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(notifier: Arc<dyn Notifier>, push_sink: Arc<dyn PushSink>) -> Self {
        Self {
            notifier,
            push_sink,
            webhook_secret: None,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn with_webhook_secret(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret;
        self
    }

    /// Wires the Misskey client and the push log file from configuration.
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let notifier = MisskeyNotifier::new(
            &config.misskey_url,
            config.misskey_access_token.clone(),
            config.notify_timeout,
        )?;
        let push_sink = FileSink::new(config.push_log_path.clone());

        Ok(Self::new(Arc::new(notifier), Arc::new(push_sink))
            .with_webhook_secret(config.webhook_secret.clone()))
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::get(api::root))
        .route(
            "/github-webhook",
            routing::post(api::handle_webhook)
                .fallback(api::method_not_allowed)
                .layer(DefaultBodyLimit::max(api::webhook::MAX_PAYLOAD_BYTES)),
        )
        .with_state(state)
}
