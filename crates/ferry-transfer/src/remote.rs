//! Remote storage seam.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Public facts about a remote object, fetched without downloading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMetadata {
    /// Size in bytes. Zero means unknown.
    pub size: u64,
    /// Object name; also the name of the downloaded file.
    pub name: String,
}

/// A public-link file store the pipeline can read from.
#[async_trait]
pub trait RemoteStorage: Send + Sync + 'static {
    /// Backend error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch size and name for `link`.
    async fn public_metadata(&self, link: &str) -> Result<RemoteMetadata, Self::Error>;

    /// Download the object behind `link` into `dir`, naming the file after
    /// the remote object. Returns the written path.
    async fn download_to(&self, link: &str, dir: &Path) -> Result<PathBuf, Self::Error>;
}
