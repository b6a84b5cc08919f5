//! Process configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::error::ConfigError;
use crate::persist::DEFAULT_PUSH_LOG;

pub const DEFAULT_PORT: u16 = 5099;
pub const DEFAULT_BIND_HOST: &str = "127.0.0.1";
pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 30;

/// Placeholders shipped in place of real credentials. The service starts with
/// them but every post will fail until they are replaced.
pub const PLACEHOLDER_MISSKEY_URL: &str = "填写你的misskey域名";
pub const PLACEHOLDER_MISSKEY_TOKEN: &str = "填写misskey账号的ACCESS TOKEN";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_host: String,
    pub port: u16,
    pub misskey_url: String,
    pub misskey_access_token: String,
    pub notify_timeout: Duration,
    pub push_log_path: PathBuf,
    pub webhook_secret: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(value) => value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    name: "PORT",
                    value,
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_PORT,
        };

        let notify_timeout_secs = match non_empty("NOTIFY_TIMEOUT_SECS") {
            Some(value) => value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    name: "NOTIFY_TIMEOUT_SECS",
                    value,
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_NOTIFY_TIMEOUT_SECS,
        };

        Ok(Self {
            bind_host: non_empty("BIND_HOST").unwrap_or_else(|| DEFAULT_BIND_HOST.to_string()),
            port,
            misskey_url: lookup("MISSKEY_URL")
                .unwrap_or_else(|| PLACEHOLDER_MISSKEY_URL.to_string()),
            misskey_access_token: lookup("MISSKEY_ACCESS_TOKEN")
                .unwrap_or_else(|| PLACEHOLDER_MISSKEY_TOKEN.to_string()),
            notify_timeout: Duration::from_secs(notify_timeout_secs),
            push_log_path: non_empty("PUSH_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PUSH_LOG)),
            webhook_secret: non_empty("GITHUB_WEBHOOK_SECRET"),
            log_dir: non_empty("LOG_DIR").map(PathBuf::from),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn warn_on_placeholders(&self) {
        if self.misskey_url == PLACEHOLDER_MISSKEY_URL {
            warn!("MISSKEY_URL is not set; posting will fail");
        }
        if self.misskey_access_token == PLACEHOLDER_MISSKEY_TOKEN {
            warn!("MISSKEY_ACCESS_TOKEN is not set; posting will fail");
        }
    }
}
