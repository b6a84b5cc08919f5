use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::io;
use tracing::error;

/// Failure kinds a webhook delivery can end in.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("{0}")]
    InvalidJson(String),

    #[error("{0}")]
    InvalidSchema(String),

    #[error("{0}")]
    InvalidSignature(String),

    #[error("key missing: {0}")]
    KeyMissing(String),

    #[error("malformed commit: {0}")]
    MalformedCommit(String),

    #[error("commit count {count} exceeds limit of {limit}")]
    TooManyCommits { count: usize, limit: usize },

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("{0}")]
    PullRequest(String),
}

/// Error codes sent to the client. One variant per row of the translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidJson,
    InvalidSchema,
    InvalidSignature,
    KeyMissing,
    ValueError,
    ConnectionError,
    PermissionError,
    PullRequestError,
    GeneralError,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidJson | ErrorKind::InvalidSchema | ErrorKind::ValueError => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::InvalidSignature => StatusCode::UNAUTHORIZED,
            ErrorKind::KeyMissing
            | ErrorKind::ConnectionError
            | ErrorKind::PermissionError
            | ErrorKind::PullRequestError
            | ErrorKind::GeneralError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidJson => "INVALID_JSON",
            ErrorKind::InvalidSchema => "INVALID_SCHEMA",
            ErrorKind::InvalidSignature => "INVALID_SIGNATURE",
            ErrorKind::KeyMissing => "KEY_MISSING",
            ErrorKind::ValueError => "VALUE_ERROR",
            ErrorKind::ConnectionError => "CONNECTION_ERROR",
            ErrorKind::PermissionError => "PERMISSION_ERROR",
            ErrorKind::PullRequestError => "PULL_REQUEST_ERROR",
            ErrorKind::GeneralError => "GENERAL_ERROR",
        }
    }

    /// Human readable summary placed in the `message` field.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::InvalidJson => "请求体数据不是合法的JSON格式",
            ErrorKind::InvalidSchema => "请求体数据格式不符合要求",
            ErrorKind::InvalidSignature => "Webhook签名验证失败",
            ErrorKind::KeyMissing => "处理推送事件键不存在错误",
            ErrorKind::ValueError => "提交数量异常",
            ErrorKind::ConnectionError => "与Misskey平台连接失败",
            ErrorKind::PermissionError => "Misskey平台访问权限验证失败",
            ErrorKind::PullRequestError => "处理拉取请求事件失败",
            ErrorKind::GeneralError => "处理推送事件失败",
        }
    }
}

impl WebhookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WebhookError::InvalidJson(_) => ErrorKind::InvalidJson,
            WebhookError::InvalidSchema(_) => ErrorKind::InvalidSchema,
            WebhookError::InvalidSignature(_) => ErrorKind::InvalidSignature,
            WebhookError::KeyMissing(_) => ErrorKind::KeyMissing,
            WebhookError::TooManyCommits { .. } => ErrorKind::ValueError,
            WebhookError::MalformedCommit(_) => ErrorKind::GeneralError,
            WebhookError::Notify(e) => e.kind(),
            WebhookError::Persist(_) => ErrorKind::GeneralError,
            WebhookError::PullRequest(_) => ErrorKind::PullRequestError,
        }
    }
}

/// Body returned for every failed delivery.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            detail: detail.into(),
            error_code: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.error_code = Some(code);
        self
    }
}

impl From<&WebhookError> for ErrorResponse {
    fn from(err: &WebhookError) -> Self {
        let kind = err.kind();
        ErrorResponse::new(kind.message(), err.to_string()).with_code(kind.code())
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        error!(
            error_code = kind.code(),
            "{}: {}",
            kind.message(),
            self
        );
        (kind.status(), Json(ErrorResponse::from(&self))).into_response()
    }
}

/// Failure reported by the notification service.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("与Misskey平台连接失败，请检查网络设置: {0}")]
    Connection(String),

    #[error("Misskey平台访问权限验证失败，请检查访问令牌是否正确: {0}")]
    Permission(String),

    #[error("notification rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    Other(String),
}

impl NotifyError {
    /// Classifies an opaque failure message by the words it contains.
    ///
    /// Only used when the client hands back nothing more structured than text.
    /// Matching on wording is brittle and breaks as soon as the remote side
    /// rephrases its errors.
    pub fn classify_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if lowered.contains("network") {
            NotifyError::Connection(message)
        } else if lowered.contains("permission") {
            NotifyError::Permission(message)
        } else {
            NotifyError::Other(message)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            NotifyError::Connection(_) => ErrorKind::ConnectionError,
            NotifyError::Permission(_) => ErrorKind::PermissionError,
            NotifyError::Rejected { .. } | NotifyError::Other(_) => ErrorKind::GeneralError,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to append to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Startup configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}
