//! The transfer pipeline: validate, fetch metadata, download, upload, report.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_read_progress::TokioAsyncReadProgressExt;
use ferry_core::UserId;
use tempfile::TempDir;
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{TransferError, TransferResult};
use crate::host::{UploadHost, UploadReader};
use crate::link::validate_link;
use crate::progress::{Milestones, Phase, ProgressCell, percent_of};
use crate::remote::{RemoteMetadata, RemoteStorage};
use crate::status::{StatusSink, StatusUpdate, send_progress, send_terminal};

/// Default time between progress samples.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default hard cap on a single upload.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Tunables for a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// How often the poller samples progress.
    pub poll_interval: Duration,
    /// Upload attempts taking longer than this fail.
    pub upload_timeout: Duration,
    /// Parent for per-transfer scratch directories. `None` uses the system
    /// temp directory.
    pub scratch_root: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            scratch_root: None,
        }
    }
}

/// One `/gofile` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// The remote-storage link as typed by the user.
    pub link: String,
    /// Who asked for it.
    pub requested_by: UserId,
}

impl TransferRequest {
    /// Build a request.
    pub fn new(link: impl Into<String>, requested_by: UserId) -> Self {
        Self {
            link: link.into(),
            requested_by,
        }
    }
}

/// A finished transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Remote file name, as uploaded.
    pub file_name: String,
    /// Public page on the upload host.
    pub download_page: String,
    /// Bytes uploaded.
    pub size: u64,
}

/// Relays one remote object to the upload host per [`Pipeline::run`] call.
///
/// The pipeline holds no per-transfer state; concurrent runs each get
/// their own scratch directory and progress cells.
#[derive(Debug)]
pub struct Pipeline<S, H> {
    storage: Arc<S>,
    host: Arc<H>,
    options: PipelineOptions,
}

impl<S, H> Pipeline<S, H>
where
    S: RemoteStorage,
    H: UploadHost,
{
    /// Assemble a pipeline over the given collaborators.
    #[must_use]
    pub fn new(storage: Arc<S>, host: Arc<H>, options: PipelineOptions) -> Self {
        Self {
            storage,
            host,
            options,
        }
    }

    /// Run the transfer and report its outcome through `sink`.
    ///
    /// Success edits the status message with the file name and download
    /// page. Failure edits it with the error; if that edit fails a fresh
    /// reply is sent instead.
    ///
    /// # Errors
    ///
    /// Returns the [`TransferError`] for whichever step failed. It has
    /// already been reported to `sink` when this returns.
    pub async fn run(
        &self,
        request: &TransferRequest,
        sink: &dyn StatusSink,
    ) -> TransferResult<UploadResult> {
        let outcome = self.execute(request, sink).await;
        let update = match &outcome {
            Ok(result) => {
                info!(
                    user = %request.requested_by,
                    file = %result.file_name,
                    page = %result.download_page,
                    "transfer complete"
                );
                StatusUpdate::Completed {
                    file_name: result.file_name.clone(),
                    download_page: result.download_page.clone(),
                }
            },
            Err(e) => {
                warn!(user = %request.requested_by, error = %e, "transfer failed");
                StatusUpdate::Failed {
                    message: e.to_string(),
                }
            },
        };
        send_terminal(sink, &update).await;
        outcome
    }

    /// Run the transfer, emitting progress but not the terminal report.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run`].
    pub async fn execute(
        &self,
        request: &TransferRequest,
        sink: &dyn StatusSink,
    ) -> TransferResult<UploadResult> {
        let link = validate_link(&request.link)?;

        let metadata = self
            .storage
            .public_metadata(link)
            .await
            .map_err(|e| TransferError::MetadataUnavailable(e.to_string()))?;
        if !is_plain_file_name(&metadata.name) {
            return Err(TransferError::MetadataUnavailable(format!(
                "unusable file name {:?}",
                metadata.name
            )));
        }
        info!(
            user = %request.requested_by,
            file = %metadata.name,
            size = metadata.size,
            "fetched remote metadata"
        );

        let scratch = self.scratch_dir()?;
        debug!(dir = %scratch.path().display(), "created scratch directory");

        send_progress(
            sink,
            &StatusUpdate::PhaseStarted {
                phase: Phase::Downloading,
            },
        )
        .await;
        self.download(link, &metadata, scratch.path(), sink).await?;

        let local = scratch.path().join(&metadata.name);
        let len = match tokio::fs::metadata(&local).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Err(TransferError::LocalFileMissing(metadata.name.clone())),
        };
        info!(file = %metadata.name, bytes = len, "download complete");

        send_progress(
            sink,
            &StatusUpdate::PhaseStarted {
                phase: Phase::Uploading,
            },
        )
        .await;
        let server = self.pick_server().await?;
        info!(server = %server, "uploading");

        let download_page = self
            .upload(server, &local, len, &metadata.name, sink)
            .await?;

        Ok(UploadResult {
            file_name: metadata.name,
            download_page,
            size: len,
        })
    }

    fn scratch_dir(&self) -> TransferResult<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ferry-");
        let dir = match &self.options.scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    async fn download(
        &self,
        link: &str,
        metadata: &RemoteMetadata,
        dir: &Path,
        sink: &dyn StatusSink,
    ) -> TransferResult<()> {
        let cell = Arc::new(ProgressCell::<PathBuf>::new());
        let worker = {
            let storage = Arc::clone(&self.storage);
            let cell = Arc::clone(&cell);
            let link = link.to_owned();
            let dir = dir.to_path_buf();
            tokio::spawn(async move {
                let outcome = storage
                    .download_to(&link, &dir)
                    .await
                    .map_err(|e| e.to_string());
                cell.finish(outcome);
            })
        };

        let watch = Watch {
            phase: Phase::Downloading,
            file_name: &metadata.name,
            total: metadata.size,
            sample_dir: Some(dir),
        };
        let written = self
            .watch(&watch, &cell, &worker, sink)
            .await
            .map_err(TransferError::DownloadFailed)?;
        debug!(path = %written.display(), "download worker finished");
        Ok(())
    }

    async fn pick_server(&self) -> TransferResult<String> {
        let servers = self
            .host
            .list_servers()
            .await
            .map_err(|e| TransferError::ServerUnavailable(e.to_string()))?;
        servers
            .into_iter()
            .next()
            .ok_or_else(|| TransferError::ServerUnavailable("server list is empty".to_owned()))
    }

    async fn upload(
        &self,
        server: String,
        path: &Path,
        len: u64,
        file_name: &str,
        sink: &dyn StatusSink,
    ) -> TransferResult<String> {
        let file = open_local(path, file_name).await?;
        let cell = Arc::new(ProgressCell::<String>::new());
        let reader = counted_reader(file, Arc::clone(&cell));

        let worker = {
            let host = Arc::clone(&self.host);
            let cell = Arc::clone(&cell);
            let name = file_name.to_owned();
            let limit = self.options.upload_timeout;
            tokio::spawn(async move {
                let attempt = host.upload_file(&server, reader, len, &name);
                let outcome = match tokio::time::timeout(limit, attempt).await {
                    Ok(Ok(response)) => {
                        // The host answered, so the whole body was consumed.
                        cell.set_bytes(len);
                        response.into_download_page()
                    },
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("timed out after {}s", limit.as_secs())),
                };
                cell.finish(outcome);
            })
        };

        let watch = Watch {
            phase: Phase::Uploading,
            file_name,
            total: len,
            sample_dir: None,
        };
        self.watch(&watch, &cell, &worker, sink)
            .await
            .map_err(TransferError::UploadFailed)
    }

    /// Poll `cell` until its worker has reported, emitting milestone edits.
    ///
    /// The worker's completion is checked before sampling, so the last
    /// sample always sees everything the worker moved.
    async fn watch<T>(
        &self,
        watch: &Watch<'_>,
        cell: &ProgressCell<T>,
        worker: &JoinHandle<()>,
        sink: &dyn StatusSink,
    ) -> Result<T, String> {
        let mut milestones = Milestones::new();
        let mut announced_unknown = false;

        loop {
            tokio::time::sleep(self.options.poll_interval).await;
            let done = cell.is_finished() || worker.is_finished();

            if let Some(dir) = watch.sample_dir {
                cell.set_bytes(directory_size(dir).await);
            }
            let moved = cell.bytes();

            match percent_of(moved, watch.total) {
                Some(percent) => {
                    if let Some(milestone) = milestones.observe(percent) {
                        debug!(phase = %watch.phase, percent = milestone, "progress");
                        send_progress(
                            sink,
                            &StatusUpdate::Progress {
                                phase: watch.phase,
                                file_name: watch.file_name.to_owned(),
                                percent: milestone,
                            },
                        )
                        .await;
                    }
                },
                None if !announced_unknown => {
                    announced_unknown = true;
                    send_progress(
                        sink,
                        &StatusUpdate::Indeterminate {
                            phase: watch.phase,
                            file_name: watch.file_name.to_owned(),
                            bytes: moved,
                        },
                    )
                    .await;
                },
                None => {},
            }

            if done {
                return cell
                    .take_outcome()
                    .unwrap_or_else(|| Err(format!("{} worker exited without reporting", watch.phase)));
            }
        }
    }
}

/// What a [`Pipeline::watch`] loop is observing.
struct Watch<'a> {
    phase: Phase,
    file_name: &'a str,
    total: u64,
    sample_dir: Option<&'a Path>,
}

/// Reject names that would escape the scratch directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

/// Cumulative size of the regular files directly inside `dir`.
///
/// Unreadable entries count as zero; the sample is only an estimate.
async fn directory_size(dir: &Path) -> u64 {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return 0;
    };
    let mut total: u64 = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if let Ok(meta) = entry.metadata().await
            && meta.is_file()
        {
            total = total.saturating_add(meta.len());
        }
    }
    total
}

/// Open the downloaded file for upload.
async fn open_local(path: &Path, file_name: &str) -> TransferResult<tokio::fs::File> {
    tokio::fs::File::open(path).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "cannot open downloaded file");
        TransferError::LocalFileMissing(file_name.to_owned())
    })
}

/// Wrap `inner` so every read stores the cumulative byte count in `cell`.
fn counted_reader<R, T>(inner: R, cell: Arc<ProgressCell<T>>) -> UploadReader
where
    R: AsyncRead + Send + Sync + Unpin + 'static,
    T: Send + 'static,
{
    Box::new(inner.report_progress(Duration::ZERO, move |read: usize| {
        cell.set_bytes(u64::try_from(read).unwrap_or(u64::MAX));
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("movie.mkv"));
        assert!(is_plain_file_name("my file (1).zip"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../etc/passwd"));
        assert!(!is_plain_file_name("a\\b"));
    }

    #[test]
    fn default_options() {
        let options = PipelineOptions::default();
        assert_eq!(options.poll_interval, Duration::from_secs(1));
        assert_eq!(options.upload_timeout, Duration::from_secs(300));
        assert!(options.scratch_root.is_none());
    }

    #[tokio::test]
    async fn counted_reader_records_every_byte() {
        let cell = Arc::new(ProgressCell::<()>::new());
        let data = std::io::Cursor::new(vec![7u8; 10_000]);
        let mut reader = counted_reader(data, Arc::clone(&cell));
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body.len(), 10_000);
        assert_eq!(cell.bytes(), 10_000);
    }

    #[tokio::test]
    async fn unopenable_download_is_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_local(&dir.path().join("movie.mkv"), "movie.mkv")
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::LocalFileMissing(ref n) if n == "movie.mkv"));
    }

    #[tokio::test]
    async fn directory_size_sums_regular_files_only() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a"), vec![0u8; 100])
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("b"), vec![0u8; 23])
            .await
            .unwrap();
        tokio::fs::create_dir(dir.path().join("sub")).await.unwrap();
        tokio::fs::write(dir.path().join("sub").join("c"), vec![0u8; 1000])
            .await
            .unwrap();
        assert_eq!(directory_size(dir.path()).await, 123);
    }

    #[tokio::test]
    async fn directory_size_of_missing_dir_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(directory_size(&dir.path().join("gone")).await, 0);
    }
}
