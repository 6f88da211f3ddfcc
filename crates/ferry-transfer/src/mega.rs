//! MEGA public-link client.
//!
//! Only the anonymous public-file flow is implemented: one `g` API command
//! returns the size, encrypted attributes, and a temporary download URL.
//! Content is decrypted with AES-128-CTR while streaming to disk. The
//! file MAC is not verified; a body whose length differs from the
//! declared size is rejected.

mod crypto;
mod link;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ctr::cipher::StreamCipher;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use self::crypto::{ContentCipher, FileKey, sanitize_file_name};
use self::link::MegaLink;
use crate::remote::{RemoteMetadata, RemoteStorage};

/// Default MEGA API endpoint.
pub const DEFAULT_API_URL: &str = "https://g.api.mega.co.nz/cs";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the MEGA client.
#[derive(Debug, Error)]
pub enum MegaError {
    /// The link is not a public MEGA file link.
    #[error("unsupported MEGA link: {0}")]
    InvalidLink(String),

    /// The key in the link is malformed.
    #[error("invalid file key: {0}")]
    InvalidKey(String),

    /// The API answered with a negative error code.
    #[error("MEGA API error {code} ({reason})")]
    Api {
        /// Raw error code.
        code: i64,
        /// Short description of the code.
        reason: &'static str,
    },

    /// The API answered with something that is not a file node.
    #[error("unexpected MEGA response: {0}")]
    UnexpectedResponse(String),

    /// Attributes could not be decrypted or parsed.
    #[error("could not decrypt file attributes: {0}")]
    BadAttributes(String),

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Writing the downloaded file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MegaError {
    /// Build an [`MegaError::Api`] from a raw code.
    #[must_use]
    pub fn api(code: i64) -> Self {
        Self::Api {
            code,
            reason: api_reason(code),
        }
    }
}

fn api_reason(code: i64) -> &'static str {
    match code {
        -2 => "bad arguments",
        -3 => "try again",
        -4 => "rate limited",
        -9 => "not found",
        -11 => "access denied",
        -16 => "blocked",
        -17 => "over quota",
        -18 => "temporarily unavailable",
        _ => "unknown error",
    }
}

/// The fields of a `g` reply the client uses.
#[derive(Debug, Deserialize)]
struct FileNode {
    /// Size in bytes.
    #[serde(rename = "s", default)]
    size: u64,
    /// Encrypted attributes.
    #[serde(rename = "at")]
    attributes: String,
    /// Temporary download URL; present only when requested.
    #[serde(rename = "g", default)]
    download_url: Option<String>,
}

/// Reads public MEGA file links.
#[derive(Debug)]
pub struct MegaClient {
    http: reqwest::Client,
    api_url: String,
    sequence: AtomicU64,
}

impl MegaClient {
    /// Client for the public API endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, MegaError> {
        Self::with_api_url(DEFAULT_API_URL)
    }

    /// Client for a specific API endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_api_url(api_url: impl Into<String>) -> Result<Self, MegaError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("ferry/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.into(),
            sequence: AtomicU64::new(0),
        })
    }

    async fn fetch_node(&self, handle: &str) -> Result<FileNode, MegaError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!([{ "a": "g", "g": 1, "p": handle }]);
        debug!(request_id = id, "MEGA file info request");

        let reply: Value = self
            .http
            .post(&self.api_url)
            .query(&[("id", id)])
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_node(reply)
    }

    async fn resolve(&self, link: &str) -> Result<(FileNode, FileKey, String), MegaError> {
        let link = MegaLink::parse(link)?;
        let key = FileKey::from_link_key(&link.key)?;
        let node = self.fetch_node(&link.handle).await?;
        let attributes = key.decrypt_attributes(&node.attributes)?;
        let name = sanitize_file_name(&attributes.name)
            .ok_or_else(|| MegaError::BadAttributes("empty file name".to_owned()))?;
        Ok((node, key, name))
    }
}

/// Interpret a `cs` reply: a bare negative number, or a one-element array
/// holding either a negative number or the node.
fn parse_node(reply: Value) -> Result<FileNode, MegaError> {
    let first = match reply {
        Value::Array(items) => items.into_iter().next().ok_or_else(|| {
            MegaError::UnexpectedResponse("empty reply".to_owned())
        })?,
        other => other,
    };
    if let Some(code) = first.as_i64() {
        return Err(MegaError::api(code));
    }
    serde_json::from_value(first).map_err(|e| MegaError::UnexpectedResponse(e.to_string()))
}

#[async_trait]
impl RemoteStorage for MegaClient {
    type Error = MegaError;

    async fn public_metadata(&self, link: &str) -> Result<RemoteMetadata, MegaError> {
        let (node, _, name) = self.resolve(link).await?;
        Ok(RemoteMetadata {
            size: node.size,
            name,
        })
    }

    async fn download_to(&self, link: &str, dir: &Path) -> Result<PathBuf, MegaError> {
        let (node, key, name) = self.resolve(link).await?;
        let url = node
            .download_url
            .ok_or_else(|| MegaError::UnexpectedResponse("no download URL".to_owned()))?;

        let response = self.http.get(&url).send().await?.error_for_status()?;
        let path = dir.join(&name);
        let mut file = tokio::fs::File::create(&path).await?;
        let written =
            write_decrypted(response.bytes_stream(), key.content_cipher(), &mut file).await?;
        check_length(written, node.size)?;

        debug!(path = %path.display(), bytes = written, "MEGA download written");
        Ok(path)
    }
}

/// Decrypt `stream` into `out`, returning the number of bytes written.
async fn write_decrypted<S, B, E, W>(
    mut stream: S,
    mut cipher: ContentCipher,
    out: &mut W,
) -> Result<u64, MegaError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    MegaError: From<E>,
    W: AsyncWrite + Unpin,
{
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let mut chunk = chunk?.as_ref().to_vec();
        cipher.apply_keystream(&mut chunk);
        out.write_all(&chunk).await?;
        written = written.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
    }
    out.flush().await?;
    Ok(written)
}

/// A body shorter or longer than the node's size is truncated or corrupt.
fn check_length(written: u64, expected: u64) -> Result<(), MegaError> {
    if written == expected {
        Ok(())
    } else {
        Err(MegaError::UnexpectedResponse(format!(
            "download size mismatch: expected {expected} bytes, received {written}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_reply() {
        let node = parse_node(serde_json::json!([
            { "s": 2_000_000, "at": "abc", "g": "https://gfs.example/dl", "msd": 1 }
        ]))
        .unwrap();
        assert_eq!(node.size, 2_000_000);
        assert_eq!(node.attributes, "abc");
        assert_eq!(node.download_url.as_deref(), Some("https://gfs.example/dl"));
    }

    #[test]
    fn negative_codes_are_api_errors() {
        let err = parse_node(serde_json::json!([-9])).unwrap_err();
        assert!(matches!(err, MegaError::Api { code: -9, .. }));
        assert_eq!(err.to_string(), "MEGA API error -9 (not found)");

        let err = parse_node(serde_json::json!(-3)).unwrap_err();
        assert!(matches!(err, MegaError::Api { code: -3, .. }));
    }

    #[test]
    fn malformed_replies() {
        assert!(matches!(
            parse_node(serde_json::json!([])),
            Err(MegaError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            parse_node(serde_json::json!([{ "s": 1 }])),
            Err(MegaError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn attributes_from_reply_decrypt_to_name() {
        let key = FileKey::from_link_key(&crypto::tests::encoded_link_key()).unwrap();
        let at = crypto::tests::encrypt_attributes(&key, r#"{"n":"movie.mkv"}"#);
        let node = parse_node(serde_json::json!([{ "s": 10, "at": at }])).unwrap();
        assert_eq!(key.decrypt_attributes(&node.attributes).unwrap().name, "movie.mkv");
        assert!(node.download_url.is_none());
    }

    #[test]
    fn unknown_api_code_reason() {
        assert_eq!(api_reason(-999), "unknown error");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MegaError>();
    }

    fn chunks(data: &[u8], size: usize) -> Vec<Result<Vec<u8>, MegaError>> {
        data.chunks(size).map(|c| Ok(c.to_vec())).collect()
    }

    #[tokio::test]
    async fn streamed_body_is_decrypted_and_counted() {
        let key = FileKey::from_link_key(&crypto::tests::encoded_link_key()).unwrap();
        let plain = b"a streamed MEGA body spanning several chunks".to_vec();
        let mut encrypted = plain.clone();
        key.content_cipher().apply_keystream(&mut encrypted);

        let mut out = Vec::new();
        let stream = futures::stream::iter(chunks(&encrypted, 7));
        let written = write_decrypted(stream, key.content_cipher(), &mut out)
            .await
            .unwrap();
        assert_eq!(written, u64::try_from(plain.len()).unwrap());
        assert_eq!(out, plain);
        check_length(written, written).unwrap();
    }

    #[tokio::test]
    async fn truncated_body_is_rejected() {
        let key = FileKey::from_link_key(&crypto::tests::encoded_link_key()).unwrap();
        let mut out = Vec::new();
        let stream = futures::stream::iter(chunks(b"only part", 4));
        let written = write_decrypted(stream, key.content_cipher(), &mut out)
            .await
            .unwrap();
        let err = check_length(written, 2_000_000).unwrap_err();
        assert!(matches!(err, MegaError::UnexpectedResponse(_)));
        assert_eq!(
            err.to_string(),
            "unexpected MEGA response: download size mismatch: expected 2000000 bytes, received 9"
        );
    }

    #[tokio::test]
    async fn stream_errors_abort_the_write() {
        let key = FileKey::from_link_key(&crypto::tests::encoded_link_key()).unwrap();
        let mut out = Vec::new();
        let stream = futures::stream::iter(vec![
            Ok(b"abc".to_vec()),
            Err(MegaError::UnexpectedResponse("connection reset".to_owned())),
        ]);
        let err = write_decrypted(stream, key.content_cipher(), &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, MegaError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn invalid_link_fails_before_network() {
        let client = MegaClient::with_api_url("http://127.0.0.1:9/cs").unwrap();
        let err = client
            .public_metadata("https://example.com/file/h#k")
            .await
            .unwrap_err();
        assert!(matches!(err, MegaError::InvalidLink(_)));
    }
}
