//! Gofile upload client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::host::{UploadHost, UploadReader, UploadResponse};

/// Default Gofile API base.
pub const DEFAULT_API_BASE: &str = "https://api.gofile.io";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the Gofile client.
#[derive(Debug, Error)]
pub enum GofileError {
    /// Non-success HTTP status, with the body's message when it had one.
    #[error("HTTP {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Message extracted from the body, or the status reason.
        message: String,
    },

    /// A server name that cannot be used as a host label.
    #[error("invalid server name {0:?}")]
    InvalidServer(String),

    /// The body was not the expected shape.
    #[error("unexpected Gofile response: {0}")]
    UnexpectedResponse(String),

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ServersEnvelope {
    status: String,
    #[serde(default)]
    data: Option<ServersData>,
}

#[derive(Debug, Deserialize)]
struct ServersData {
    #[serde(default)]
    servers: Vec<Server>,
}

#[derive(Debug, Deserialize)]
struct Server {
    name: String,
}

/// Uploads files to Gofile anonymously.
#[derive(Debug, Clone)]
pub struct GofileClient {
    http: reqwest::Client,
    api_base: String,
}

impl GofileClient {
    /// Client for the public API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, GofileError> {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    /// Client with a custom API base for the server listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_api_base(api_base: impl Into<String>) -> Result<Self, GofileError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("ferry/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
        })
    }
}

/// `https://<server>.gofile.io/uploadFile`, refusing names that would
/// change the host.
fn upload_url(server: &str) -> Result<String, GofileError> {
    let valid = !server.is_empty()
        && server
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid {
        return Err(GofileError::InvalidServer(server.to_owned()));
    }
    Ok(format!("https://{server}.gofile.io/uploadFile"))
}

/// Pull `data.message`, then `status`, out of an error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/data/message")
        .and_then(Value::as_str)
        .or_else(|| value.get("status").and_then(Value::as_str))
        .map(str::to_owned)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GofileError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_owned()
    });
    Err(GofileError::Status {
        code: status.as_u16(),
        message,
    })
}

fn server_names(envelope: ServersEnvelope) -> Result<Vec<String>, GofileError> {
    if envelope.status != "ok" {
        return Err(GofileError::UnexpectedResponse(format!(
            "server listing status {:?}",
            envelope.status
        )));
    }
    Ok(envelope
        .data
        .map(|d| d.servers.into_iter().map(|s| s.name).collect())
        .unwrap_or_default())
}

#[async_trait]
impl UploadHost for GofileClient {
    type Error = GofileError;

    async fn list_servers(&self) -> Result<Vec<String>, GofileError> {
        let url = format!("{}/servers", self.api_base);
        let response = check_status(self.http.get(&url).send().await?).await?;
        let envelope: ServersEnvelope = response.json().await?;
        let names = server_names(envelope)?;
        debug!(count = names.len(), "Gofile servers listed");
        Ok(names)
    }

    async fn upload_file(
        &self,
        server: &str,
        reader: UploadReader,
        len: u64,
        file_name: &str,
    ) -> Result<UploadResponse, GofileError> {
        let url = upload_url(server)?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(reader));
        let part = Part::stream_with_length(body, len).file_name(file_name.to_owned());
        let form = Form::new().part("file", part);

        let response = check_status(self.http.post(&url).multipart(form).send().await?).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| GofileError::UnexpectedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_upload_url() {
        assert_eq!(
            upload_url("store1").unwrap(),
            "https://store1.gofile.io/uploadFile"
        );
        assert!(upload_url("store-eu-2").is_ok());
    }

    #[test]
    fn rejects_hostile_server_names() {
        for bad in ["", "evil.com/x", "a.b", "x@y", "store 1"] {
            assert!(
                matches!(upload_url(bad), Err(GofileError::InvalidServer(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn parses_server_listing() {
        let envelope: ServersEnvelope = serde_json::from_str(
            r#"{"status":"ok","data":{"servers":[{"name":"store3","zone":"eu"},{"name":"store9","zone":"na"}]}}"#,
        )
        .unwrap();
        assert_eq!(server_names(envelope).unwrap(), vec!["store3", "store9"]);
    }

    #[test]
    fn empty_server_listing_is_empty() {
        let envelope: ServersEnvelope =
            serde_json::from_str(r#"{"status":"ok","data":{"servers":[]}}"#).unwrap();
        assert!(server_names(envelope).unwrap().is_empty());
    }

    #[test]
    fn non_ok_server_listing_is_error() {
        let envelope: ServersEnvelope =
            serde_json::from_str(r#"{"status":"error-rateLimit"}"#).unwrap();
        assert!(matches!(
            server_names(envelope),
            Err(GofileError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn extracts_error_messages() {
        assert_eq!(
            error_message(r#"{"status":"error","data":{"message":"file too large"}}"#).as_deref(),
            Some("file too large")
        );
        assert_eq!(
            error_message(r#"{"status":"error-notPremium","data":{}}"#).as_deref(),
            Some("error-notPremium")
        );
        assert_eq!(error_message("<html>502</html>"), None);
    }

    #[test]
    fn status_error_display() {
        let err = GofileError::Status {
            code: 413,
            message: "file too large".to_owned(),
        };
        assert_eq!(err.to_string(), "HTTP 413: file too large");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GofileError>();
    }
}
