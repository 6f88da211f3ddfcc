use serde::{Deserialize, Serialize};

/// Default welcome animation shown by `/start`.
pub const DEFAULT_WELCOME_ANIMATION_URL: &str = "https://i.imgur.com/7V8dZ0l.gif";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Telegram bot settings.
    pub bot: BotSection,
    /// Transfer pipeline tuning.
    pub transfer: TransferSection,
    /// Logging settings.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// BotSection
// ---------------------------------------------------------------------------

/// Telegram bot settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSection {
    /// Telegram Bot API token (from `@BotFather`).
    /// Prefer the `BOT_TOKEN` environment variable over storing this in a file.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// The super-admin's Telegram user id. Zero means unset.
    pub main_admin_id: u64,
    /// Animation sent with the `/start` caption.
    pub welcome_animation_url: String,
    /// Display toggle carried for compatibility; not consumed by the relay.
    pub document_as_file: bool,
    /// Display toggle carried for compatibility; not consumed by the relay.
    pub use_thumbnail: bool,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            token: None,
            main_admin_id: 0,
            welcome_animation_url: DEFAULT_WELCOME_ANIMATION_URL.to_owned(),
            document_as_file: true,
            use_thumbnail: true,
        }
    }
}

impl std::fmt::Debug for BotSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotSection")
            .field("has_token", &self.token.is_some())
            .field("main_admin_id", &self.main_admin_id)
            .field("welcome_animation_url", &self.welcome_animation_url)
            .field("document_as_file", &self.document_as_file)
            .field("use_thumbnail", &self.use_thumbnail)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TransferSection
// ---------------------------------------------------------------------------

/// Transfer pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferSection {
    /// How often the progress poller samples transferred bytes.
    pub poll_interval_ms: u64,
    /// Hard cap on the whole upload request.
    pub upload_timeout_secs: u64,
    /// Number of glyphs in the rendered progress bar.
    pub bar_width: u8,
}

impl Default for TransferSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            upload_timeout_secs: 300,
            bar_width: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level filter.
    pub level: String,
    /// One of `pretty`, `compact`, `json`, `full`.
    pub format: String,
    /// Extra filter directives (e.g. `ferry_transfer=debug`).
    pub directives: Vec<String>,
    /// Write rolling log files here instead of stderr.
    pub directory: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}
