//! Error types for the transfer pipeline.

use thiserror::Error;

/// Ways a transfer can fail. Each variant maps to one pipeline step.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The link does not start with an accepted remote-storage prefix.
    #[error("invalid link {0:?}: must start with https://mega.nz/ or https://mega.io/")]
    InvalidLink(String),

    /// The remote object's size and name could not be fetched.
    #[error("could not fetch file info: {0}")]
    MetadataUnavailable(String),

    /// The background download reported an error.
    #[error("download failed: {0}")]
    DownloadFailed(String),

    /// The download finished but no file with the declared name exists.
    #[error("downloaded file {0:?} not found in the scratch directory")]
    LocalFileMissing(String),

    /// No upload server could be assigned.
    #[error("no upload server available: {0}")]
    ServerUnavailable(String),

    /// The upload failed or the host rejected it.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// The scratch directory or the local file could not be used.
    #[error("local storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type TransferResult<T> = Result<T, TransferError>;
