//! Request context for correlating the log lines of one command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context carried through one command invocation (e.g. a transfer).
///
/// Its [`span`](Self::span) tags every log line emitted while the command
/// runs, so interleaved transfers can be told apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: Uuid,
    /// Chat user that issued the command, if known.
    pub user_id: Option<u64>,
    /// Chat the command arrived in, if known.
    pub chat_id: Option<i64>,
    /// When the request started.
    pub started_at: DateTime<Utc>,
    /// Component that created this context.
    pub source: String,
    /// Operation being performed.
    pub operation: Option<String>,
}

impl RequestContext {
    /// Create a new request context.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user_id: None,
            chat_id: None,
            started_at: Utc::now(),
            source: source.into(),
            operation: None,
        }
    }

    /// Set the requesting user.
    #[must_use]
    pub fn with_user_id(mut self, id: u64) -> Self {
        self.user_id = Some(id);
        self
    }

    /// Set the originating chat.
    #[must_use]
    pub fn with_chat_id(mut self, id: i64) -> Self {
        self.chat_id = Some(id);
        self
    }

    /// Set the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Elapsed time in milliseconds since the request started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// First eight characters of the request id.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.request_id.simple().to_string().chars().take(8).collect()
    }

    /// Create a tracing span with this context.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            id = %self.short_id(),
            source = %self.source,
            operation = self.operation.as_deref(),
            user = self.user_id,
            chat = self.chat_id,
        )
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_creation() {
        let ctx = RequestContext::new("telegram");
        assert_eq!(ctx.source, "telegram");
        assert!(ctx.user_id.is_none());
        assert!(ctx.chat_id.is_none());
        assert!(ctx.operation.is_none());
    }

    #[test]
    fn test_request_context_builder() {
        let ctx = RequestContext::new("telegram")
            .with_user_id(42)
            .with_chat_id(-100)
            .with_operation("gofile");

        assert_eq!(ctx.user_id, Some(42));
        assert_eq!(ctx.chat_id, Some(-100));
        assert_eq!(ctx.operation.as_deref(), Some("gofile"));
    }

    #[test]
    fn test_distinct_ids() {
        let a = RequestContext::new("x");
        let b = RequestContext::new("x");
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_elapsed() {
        let ctx = RequestContext::new("test");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(ctx.elapsed_ms() >= 10);
    }

    #[test]
    fn test_short_id() {
        let ctx = RequestContext::new("test");
        assert_eq!(ctx.short_id().len(), 8);
    }

    #[test]
    fn test_serialization() {
        let ctx = RequestContext::new("telegram").with_operation("admin");

        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("\"source\":\"telegram\""));
        assert!(json.contains("\"operation\":\"admin\""));

        let parsed: RequestContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.request_id, ctx.request_id);
    }
}
