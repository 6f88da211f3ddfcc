//! MEGA public file link parsing.

use url::Url;

use super::MegaError;

const HOSTS: &[&str] = &["mega.nz", "mega.io", "mega.co.nz"];

/// The two halves of a public file link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MegaLink {
    /// Public node handle, sent to the API.
    pub(crate) handle: String,
    /// Base64 file key; never leaves the process.
    pub(crate) key: String,
}

impl MegaLink {
    /// Parse `https://mega.nz/file/<handle>#<key>` or the legacy
    /// `https://mega.nz/#!<handle>!<key>` form.
    pub(crate) fn parse(link: &str) -> Result<Self, MegaError> {
        let url = Url::parse(link.trim()).map_err(|e| MegaError::InvalidLink(e.to_string()))?;

        let host = url.host_str().unwrap_or_default();
        let host = host.strip_prefix("www.").unwrap_or(host);
        if !HOSTS.contains(&host) {
            return Err(MegaError::InvalidLink(format!("unknown host {host:?}")));
        }

        let fragment = url.fragment().unwrap_or_default();
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            ["file", handle] => {
                // `#key/file/<child>` addresses a file inside a folder share.
                let key = fragment.split('/').next().unwrap_or_default();
                Self::build(handle, key)
            },
            ["folder", ..] => Err(MegaError::InvalidLink(
                "folder links are not supported".to_owned(),
            )),
            [] => Self::parse_legacy(fragment),
            _ => Err(MegaError::InvalidLink(format!(
                "unrecognized path {:?}",
                url.path()
            ))),
        }
    }

    fn parse_legacy(fragment: &str) -> Result<Self, MegaError> {
        if fragment.starts_with("F!") {
            return Err(MegaError::InvalidLink(
                "folder links are not supported".to_owned(),
            ));
        }
        let rest = fragment
            .strip_prefix('!')
            .ok_or_else(|| MegaError::InvalidLink("missing file handle".to_owned()))?;
        let (handle, key) = rest
            .split_once('!')
            .ok_or_else(|| MegaError::InvalidLink("missing file key".to_owned()))?;
        Self::build(handle, key)
    }

    fn build(handle: &str, key: &str) -> Result<Self, MegaError> {
        if handle.is_empty() {
            return Err(MegaError::InvalidLink("missing file handle".to_owned()));
        }
        if key.is_empty() {
            return Err(MegaError::InvalidLink("missing file key".to_owned()));
        }
        Ok(Self {
            handle: handle.to_owned(),
            key: key.to_owned(),
        })
    }
}
