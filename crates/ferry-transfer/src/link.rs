//! Remote-storage link validation.

use crate::error::{TransferError, TransferResult};

/// Link prefixes the pipeline accepts.
pub const ACCEPTED_PREFIXES: &[&str] = &["https://mega.nz/", "https://mega.io/"];

/// Check that `link` points at a supported remote-storage host.
///
/// Surrounding whitespace is ignored. No network access happens here.
///
/// # Errors
///
/// Returns [`TransferError::InvalidLink`] when no accepted prefix matches.
pub fn validate_link(link: &str) -> TransferResult<&str> {
    let trimmed = link.trim();
    if ACCEPTED_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
    {
        Ok(trimmed)
    } else {
        Err(TransferError::InvalidLink(trimmed.to_owned()))
    }
}
