//! Ferry Telemetry - logging and tracing for the Ferry relay bot.
//!
//! This crate provides:
//! - Configurable logging setup with multiple formats and targets
//! - Request context so every transfer runs inside its own span
//!
//! # Example
//!
//! ```rust,no_run
//! use ferry_telemetry::{LogConfig, LogFormat, setup_logging, RequestContext};
//!
//! # fn main() -> Result<(), ferry_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("ferry_transfer=debug");
//!
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("telegram").with_operation("gofile");
//! let _guard = ctx.span().entered();
//! tracing::info!("transfer started");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::RequestContext;
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging,
};
