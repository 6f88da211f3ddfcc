//! Status updates emitted by the pipeline and the sink that delivers them.

use async_trait::async_trait;
use thiserror::Error;

use crate::progress::Phase;

/// A single user-visible report about a running transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// A phase is about to start.
    PhaseStarted {
        /// The phase.
        phase: Phase,
    },
    /// A new 5% milestone was reached.
    Progress {
        /// The phase.
        phase: Phase,
        /// Remote file name.
        file_name: String,
        /// Milestone percentage, a multiple of five.
        percent: u8,
    },
    /// The total size is unknown, so only the byte count can be shown.
    Indeterminate {
        /// The phase.
        phase: Phase,
        /// Remote file name.
        file_name: String,
        /// Bytes moved so far.
        bytes: u64,
    },
    /// The upload succeeded.
    Completed {
        /// Remote file name.
        file_name: String,
        /// Public download page on the upload host.
        download_page: String,
    },
    /// The transfer failed.
    Failed {
        /// Human-readable reason.
        message: String,
    },
}

/// A status delivery failure. Carries the transport's message only.
#[derive(Debug, Clone, Error)]
#[error("status delivery failed: {0}")]
pub struct SinkError(pub String);

impl SinkError {
    /// Wrap any displayable transport error.
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self(message.to_string())
    }
}

/// Where status updates go.
///
/// `edit` rewrites the single status message owned by the transfer; `reply`
/// posts a fresh message and is only used when an edit of a terminal
/// update fails.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Replace the status message with `update`.
    async fn edit(&self, update: &StatusUpdate) -> Result<(), SinkError>;

    /// Send `update` as a new message.
    async fn reply(&self, update: &StatusUpdate) -> Result<(), SinkError>;
}

/// Best-effort progress edit. Failures are logged and never abort a transfer.
pub(crate) async fn send_progress(sink: &dyn StatusSink, update: &StatusUpdate) {
    if let Err(e) = sink.edit(update).await {
        tracing::debug!(error = %e, "progress edit failed");
    }
}

/// Deliver a terminal update: edit first, then a fresh reply, then give up
/// with a warning.
pub(crate) async fn send_terminal(sink: &dyn StatusSink, update: &StatusUpdate) {
    let Err(edit_err) = sink.edit(update).await else {
        return;
    };
    tracing::debug!(error = %edit_err, "terminal edit failed, replying instead");
    if let Err(reply_err) = sink.reply(update).await {
        tracing::warn!(
            edit_error = %edit_err,
            reply_error = %reply_err,
            "could not deliver final transfer status"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_error_display() {
        let err = SinkError::new("message is not modified");
        assert_eq!(
            err.to_string(),
            "status delivery failed: message is not modified"
        );
    }
}
