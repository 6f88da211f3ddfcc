//! Upload host seam and the host's response envelope.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

/// Byte source handed to an upload host.
pub type UploadReader = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// Response envelope returned by the upload endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// `"ok"` on success; anything else is a rejection.
    pub status: String,
    /// Payload; its shape depends on `status`.
    #[serde(default)]
    pub data: Option<UploadData>,
}

/// Payload of an [`UploadResponse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadData {
    /// Public page for the uploaded file.
    #[serde(rename = "downloadPage", default, skip_serializing_if = "Option::is_none")]
    pub download_page: Option<String>,
    /// Host-provided explanation on rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadResponse {
    /// A successful response carrying `download_page`.
    #[must_use]
    pub fn ok(download_page: impl Into<String>) -> Self {
        Self {
            status: "ok".to_owned(),
            data: Some(UploadData {
                download_page: Some(download_page.into()),
                message: None,
            }),
        }
    }

    /// A rejection with `status` and an optional host message.
    #[must_use]
    pub fn rejected(status: impl Into<String>, message: Option<String>) -> Self {
        Self {
            status: status.into(),
            data: Some(UploadData {
                download_page: None,
                message,
            }),
        }
    }

    /// Reduce the envelope to the download page or a failure message.
    ///
    /// # Errors
    ///
    /// Returns the host's message (or `"unknown error"`) when the status is
    /// not `"ok"`, and a fixed message when an ok response has no page.
    pub fn into_download_page(self) -> Result<String, String> {
        let data = self.data.unwrap_or_default();
        if self.status != "ok" {
            return Err(data
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "unknown error".to_owned()));
        }
        data.download_page
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| "upload host returned no download page".to_owned())
    }
}

/// A file host the pipeline uploads to.
#[async_trait]
pub trait UploadHost: Send + Sync + 'static {
    /// Backend error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Names of servers currently accepting uploads, best first.
    async fn list_servers(&self) -> Result<Vec<String>, Self::Error>;

    /// Upload `len` bytes from `reader` to `server` under `file_name`.
    async fn upload_file(
        &self,
        server: &str,
        reader: UploadReader,
        len: u64,
        file_name: &str,
    ) -> Result<UploadResponse, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_yields_page() {
        let resp: UploadResponse = serde_json::from_str(
            r#"{"status":"ok","data":{"downloadPage":"https://gofile.io/d/XYZ","code":"XYZ"}}"#,
        )
        .unwrap();
        assert_eq!(
            resp.into_download_page().unwrap(),
            "https://gofile.io/d/XYZ"
        );
    }

    #[test]
    fn rejected_response_yields_message() {
        let resp: UploadResponse = serde_json::from_str(
            r#"{"status":"error-quota","data":{"message":"quota exceeded"}}"#,
        )
        .unwrap();
        assert_eq!(resp.into_download_page().unwrap_err(), "quota exceeded");
    }

    #[test]
    fn rejected_without_message_is_unknown() {
        let resp: UploadResponse = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert_eq!(resp.into_download_page().unwrap_err(), "unknown error");
    }

    #[test]
    fn ok_without_page_is_an_error() {
        let resp: UploadResponse = serde_json::from_str(r#"{"status":"ok","data":{}}"#).unwrap();
        assert!(resp.into_download_page().is_err());
    }

    #[test]
    fn constructors_round_trip_through_interpretation() {
        assert_eq!(
            UploadResponse::ok("https://gofile.io/d/a").into_download_page(),
            Ok("https://gofile.io/d/a".to_owned())
        );
        assert_eq!(
            UploadResponse::rejected("error", Some("nope".into())).into_download_page(),
            Err("nope".to_owned())
        );
    }
}
