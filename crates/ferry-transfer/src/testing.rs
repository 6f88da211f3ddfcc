//! In-memory collaborator fakes for pipeline tests.
//!
//! Enabled with the `test-support` feature.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::host::{UploadHost, UploadReader, UploadResponse};
use crate::remote::{RemoteMetadata, RemoteStorage};
use crate::status::{SinkError, StatusSink, StatusUpdate};

/// Error raised by the fakes.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct FakeError(pub String);

/// A [`RemoteStorage`] serving one fixed object.
#[derive(Debug)]
pub struct FakeStorage {
    metadata: Result<RemoteMetadata, String>,
    written_name: String,
    content: Vec<u8>,
    download_error: Option<String>,
    chunks: usize,
    chunk_delay: Duration,
    metadata_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl FakeStorage {
    /// Serve `content` under `name`, declaring its true size.
    #[must_use]
    pub fn new(name: &str, content: Vec<u8>) -> Self {
        let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
        Self {
            metadata: Ok(RemoteMetadata {
                size,
                name: name.to_owned(),
            }),
            written_name: name.to_owned(),
            content,
            download_error: None,
            chunks: 1,
            chunk_delay: Duration::ZERO,
            metadata_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    /// Make the metadata call fail.
    #[must_use]
    pub fn with_metadata_error(mut self, message: &str) -> Self {
        self.metadata = Err(message.to_owned());
        self
    }

    /// Override the declared size.
    #[must_use]
    pub fn with_declared_size(mut self, size: u64) -> Self {
        if let Ok(meta) = &mut self.metadata {
            meta.size = size;
        }
        self
    }

    /// Write the content under a different name than the declared one.
    #[must_use]
    pub fn writing_as(mut self, name: &str) -> Self {
        name.clone_into(&mut self.written_name);
        self
    }

    /// Make the download fail after writing nothing.
    #[must_use]
    pub fn with_download_error(mut self, message: &str) -> Self {
        self.download_error = Some(message.to_owned());
        self
    }

    /// Write the content in `chunks` pieces with `delay` between them.
    #[must_use]
    pub fn in_chunks(mut self, chunks: usize, delay: Duration) -> Self {
        self.chunks = chunks.max(1);
        self.chunk_delay = delay;
        self
    }

    /// Number of metadata calls so far.
    #[must_use]
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    /// Number of download calls so far.
    #[must_use]
    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStorage for FakeStorage {
    type Error = FakeError;

    async fn public_metadata(&self, _link: &str) -> Result<RemoteMetadata, FakeError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata.clone().map_err(FakeError)
    }

    async fn download_to(&self, _link: &str, dir: &Path) -> Result<PathBuf, FakeError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.download_error {
            return Err(FakeError(message.clone()));
        }

        let path = dir.join(&self.written_name);
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| FakeError(e.to_string()))?;
        let chunk_len = self.content.len().div_ceil(self.chunks).max(1);
        for chunk in self.content.chunks(chunk_len) {
            file.write_all(chunk)
                .await
                .map_err(|e| FakeError(e.to_string()))?;
            file.flush().await.map_err(|e| FakeError(e.to_string()))?;
            if !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
        }
        Ok(path)
    }
}

/// An [`UploadHost`] that drains the reader and returns a canned response.
#[derive(Debug)]
pub struct FakeHost {
    servers: Result<Vec<String>, String>,
    response: Result<UploadResponse, String>,
    delay: Duration,
    list_calls: AtomicUsize,
    received: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl FakeHost {
    /// One server, `store1`, answering with `response`.
    #[must_use]
    pub fn new(response: UploadResponse) -> Self {
        Self {
            servers: Ok(vec!["store1".to_owned()]),
            response: Ok(response),
            delay: Duration::ZERO,
            list_calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Replace the server list.
    #[must_use]
    pub fn with_servers(mut self, servers: Vec<String>) -> Self {
        self.servers = Ok(servers);
        self
    }

    /// Make the server listing fail.
    #[must_use]
    pub fn with_servers_error(mut self, message: &str) -> Self {
        self.servers = Err(message.to_owned());
        self
    }

    /// Make the upload call itself fail.
    #[must_use]
    pub fn with_upload_error(mut self, message: &str) -> Self {
        self.response = Err(message.to_owned());
        self
    }

    /// Wait this long after draining the reader before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of server listings so far.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// `(server, file name, bytes)` for every upload received.
    #[must_use]
    pub fn received(&self) -> Vec<(String, String, Vec<u8>)> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl UploadHost for FakeHost {
    type Error = FakeError;

    async fn list_servers(&self) -> Result<Vec<String>, FakeError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.servers.clone().map_err(FakeError)
    }

    async fn upload_file(
        &self,
        server: &str,
        mut reader: UploadReader,
        _len: u64,
        file_name: &str,
    ) -> Result<UploadResponse, FakeError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| FakeError(e.to_string()))?;
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((server.to_owned(), file_name.to_owned(), bytes));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.clone().map_err(FakeError)
    }
}

/// A [`StatusSink`] that records everything it is asked to deliver.
#[derive(Debug, Default)]
pub struct RecordingSink {
    edits: Mutex<Vec<StatusUpdate>>,
    replies: Mutex<Vec<StatusUpdate>>,
    fail_edits: bool,
    fail_replies: bool,
}

impl RecordingSink {
    /// A sink where every delivery succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every edit fails.
    #[must_use]
    pub fn failing_edits(mut self) -> Self {
        self.fail_edits = true;
        self
    }

    /// Every reply fails.
    #[must_use]
    pub fn failing_replies(mut self) -> Self {
        self.fail_replies = true;
        self
    }

    /// Updates delivered as edits, in order. Failed edits are included.
    #[must_use]
    pub fn edits(&self) -> Vec<StatusUpdate> {
        self.edits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Updates delivered as replies, in order. Failed replies are included.
    #[must_use]
    pub fn replies(&self) -> Vec<StatusUpdate> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl StatusSink for RecordingSink {
    async fn edit(&self, update: &StatusUpdate) -> Result<(), SinkError> {
        self.edits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(update.clone());
        if self.fail_edits {
            Err(SinkError::new("edit rejected"))
        } else {
            Ok(())
        }
    }

    async fn reply(&self, update: &StatusUpdate) -> Result<(), SinkError> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(update.clone());
        if self.fail_replies {
            Err(SinkError::new("reply rejected"))
        } else {
            Ok(())
        }
    }
}
