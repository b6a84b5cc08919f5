//! Persistence sink: append-only local record of every report.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::PersistError;

pub const DEFAULT_PUSH_LOG: &str = "github_push_info.txt";

#[async_trait]
pub trait PushSink: Send + Sync {
    async fn append(&self, text: &str) -> Result<(), PersistError>;
}

/// Appends to a single file. Writes from concurrent deliveries are serialized
/// so each report lands contiguously.
pub struct FileSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl PushSink for FileSink {
    async fn append(&self, text: &str) -> Result<(), PersistError> {
        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        file.write_all(text.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;

        debug!("Appended {} bytes to {}", text.len(), self.path.display());
        Ok(())
    }
}
