//! Runtime settings for the Telegram frontend.
//!
//! Built from the loaded [`ferry_config::Config`]; the loader has already
//! merged environment fallbacks and validated the values.

use std::time::Duration;

use ferry_core::UserId;
use ferry_transfer::PipelineOptions;
use url::Url;

use crate::error::{TelegramBotError, TelegramResult};

/// Telegram bot configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Telegram Bot API token (from `@BotFather`).
    pub bot_token: String,
    /// The fixed super-admin.
    pub main_admin_id: UserId,
    /// Animation sent with the `/start` caption.
    pub welcome_animation_url: Url,
    /// Carried from configuration; the relay does not send documents.
    pub document_as_file: bool,
    /// Carried from configuration; the relay does not send thumbnails.
    pub use_thumbnail: bool,
    /// Progress bar width in glyphs.
    pub bar_width: usize,
    /// Pipeline timing.
    pub pipeline: PipelineOptions,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("main_admin_id", &self.main_admin_id)
            .field("welcome_animation_url", &self.welcome_animation_url.as_str())
            .field("document_as_file", &self.document_as_file)
            .field("use_thumbnail", &self.use_thumbnail)
            .field("bar_width", &self.bar_width)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl TelegramConfig {
    /// Derive frontend settings from the process configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramBotError::Config`] if the token, admin id, or
    /// animation URL is unusable.
    pub fn from_config(config: &ferry_config::Config) -> TelegramResult<Self> {
        let bot = &config.bot;

        let bot_token = bot
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                TelegramBotError::Config(
                    "bot token is required; set [bot] token in ~/.ferry/config.toml \
                     or the BOT_TOKEN env var"
                        .to_owned(),
                )
            })?;

        if bot.main_admin_id == 0 {
            return Err(TelegramBotError::Config(
                "main_admin_id must be a non-zero user id".to_owned(),
            ));
        }

        let welcome_animation_url = Url::parse(&bot.welcome_animation_url).map_err(|e| {
            TelegramBotError::Config(format!("welcome_animation_url: {e}"))
        })?;

        Ok(Self {
            bot_token,
            main_admin_id: UserId(bot.main_admin_id),
            welcome_animation_url,
            document_as_file: bot.document_as_file,
            use_thumbnail: bot.use_thumbnail,
            bar_width: usize::from(config.transfer.bar_width),
            pipeline: PipelineOptions {
                poll_interval: Duration::from_millis(config.transfer.poll_interval_ms),
                upload_timeout: Duration::from_secs(config.transfer.upload_timeout_secs),
                scratch_root: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> ferry_config::Config {
        let mut config = ferry_config::Config::default();
        config.bot.token = Some("123456:secret-token".to_owned());
        config.bot.main_admin_id = 1000;
        config
    }

    #[test]
    fn derives_settings() {
        let mut config = loaded();
        config.transfer.poll_interval_ms = 250;
        config.transfer.upload_timeout_secs = 60;
        config.transfer.bar_width = 10;

        let tg = TelegramConfig::from_config(&config).unwrap();
        assert_eq!(tg.main_admin_id, UserId(1000));
        assert_eq!(tg.bar_width, 10);
        assert_eq!(tg.pipeline.poll_interval, Duration::from_millis(250));
        assert_eq!(tg.pipeline.upload_timeout, Duration::from_secs(60));
        assert_eq!(
            tg.welcome_animation_url.as_str(),
            ferry_config::DEFAULT_WELCOME_ANIMATION_URL
        );
    }

    #[test]
    fn missing_token_is_config_error() {
        let mut config = loaded();
        config.bot.token = None;
        assert!(matches!(
            TelegramConfig::from_config(&config),
            Err(TelegramBotError::Config(_))
        ));
    }

    #[test]
    fn zero_admin_is_config_error() {
        let mut config = loaded();
        config.bot.main_admin_id = 0;
        assert!(TelegramConfig::from_config(&config).is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let tg = TelegramConfig::from_config(&loaded()).unwrap();
        let debug = format!("{tg:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
