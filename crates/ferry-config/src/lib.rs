#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Configuration for the Ferry relay bot.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ferry_config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("super-admin: {}", config.bot.main_admin_id);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Config file**: `$FERRY_CONFIG` if set, otherwise `~/.ferry/config.toml`
//! 2. **Environment variables** (`BOT_TOKEN`, `MAIN_ADMIN_ID`, ...), fallback
//!    for fields the file leaves unset
//! 3. **Built-in defaults**
//!
//! Configuration is read once at startup. A missing bot token or super-admin
//! id is fatal.

/// Configuration error types.
pub mod error;
/// Configuration file discovery and environment fallbacks.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load configuration from the config file and process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is unreadable or malformed, an
    /// environment value cannot be converted, or validation fails.
    pub fn load() -> ConfigResult<Self> {
        loader::load()
    }
}
