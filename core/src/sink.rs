//! Output sink: where published values end up.
//!
//! Writes and deletes are best-effort. A capture tool may hold a file open while
//! reading it, so failed operations are retried a few times and then given up
//! with a log line. Nothing here ever fails the caller.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use stream_out_types::SinkRetrySettings;
use thiserror::Error;

/// A value ready to be shown by an overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    /// Encoded image bytes (PNG)
    Image(Vec<u8>),
}

impl Payload {
    fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Image(bytes) => bytes,
        }
    }
}

#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Publish `payload` under `name`. With `overwrite = false` an existing output is kept.
    /// Returns whether the output is now in place.
    async fn publish(&self, name: &str, payload: Payload, overwrite: bool) -> bool;

    /// Remove an output. A missing output counts as removed.
    async fn delete(&self, name: &str) -> bool;

    async fn write_text(&self, name: &str, text: String) -> bool {
        self.publish(name, Payload::Text(text), true).await
    }

    /// Write a placeholder that must not clobber a value from a previous run.
    async fn write_placeholder(&self, name: &str, text: String) -> bool {
        self.publish(name, Payload::Text(text), false).await
    }

    async fn write_image(&self, name: &str, bytes: Vec<u8>) -> bool {
        self.publish(name, Payload::Image(bytes), true).await
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to delete {path:?}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SinkError {
    fn io_kind(&self) -> ErrorKind {
        match self {
            Self::Write { source, .. } | Self::Delete { source, .. } => source.kind(),
        }
    }
}

/// Sink writing one file per output into a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    retries: u32,
    delay: Duration,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, retry: SinkRetrySettings) -> Self {
        Self {
            dir: dir.into(),
            retries: retry.retries,
            delay: Duration::from_millis(retry.delay_ms),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    async fn try_write(&self, path: &Path, bytes: &[u8]) -> Result<(), SinkError> {
        let write = async {
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(path, bytes).await
        };
        write.await.map_err(|source| SinkError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    async fn try_delete(&self, path: &Path) -> Result<(), SinkError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SinkError::Delete {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn log_abandoned(err: &SinkError) {
        // Locked or missing folders are expected while a capture tool is reading
        match err.io_kind() {
            ErrorKind::PermissionDenied | ErrorKind::NotFound => {
                tracing::info!(error = %err, "Giving up on output")
            }
            _ => tracing::warn!(error = %err, "Giving up on output"),
        }
    }
}

#[async_trait]
impl OutputSink for FileSink {
    async fn publish(&self, name: &str, payload: Payload, overwrite: bool) -> bool {
        let path = self.path_for(name);
        if !overwrite && tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return true;
        }

        let mut retries_left = self.retries;
        loop {
            match self.try_write(&path, payload.as_bytes()).await {
                Ok(()) => return true,
                Err(e) if retries_left > 0 => {
                    tracing::debug!(error = %e, retries_left, "Write failed, retrying");
                    retries_left -= 1;
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => {
                    Self::log_abandoned(&e);
                    return false;
                }
            }
        }
    }

    async fn delete(&self, name: &str) -> bool {
        let path = self.path_for(name);
        let mut retries_left = self.retries;
        loop {
            match self.try_delete(&path).await {
                Ok(()) => return true,
                Err(e) if retries_left > 0 => {
                    tracing::debug!(error = %e, retries_left, "Delete failed, retrying");
                    retries_left -= 1;
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => {
                    Self::log_abandoned(&e);
                    return false;
                }
            }
        }
    }
}
