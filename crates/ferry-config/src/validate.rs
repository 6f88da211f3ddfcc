//! Post-load configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Upper bound for the rendered progress bar width.
const MAX_BAR_WIDTH: u8 = 50;

/// Validate a fully-loaded configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_bot(config)?;
    validate_transfer(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_bot(config: &Config) -> ConfigResult<()> {
    let bot = &config.bot;

    if bot.token.as_deref().is_none_or(|t| t.trim().is_empty()) {
        return Err(ConfigError::Missing {
            field: "bot.token".to_owned(),
            hint: "set [bot] token in ~/.ferry/config.toml or the BOT_TOKEN env var".to_owned(),
        });
    }

    if bot.main_admin_id == 0 {
        return Err(ConfigError::Missing {
            field: "bot.main_admin_id".to_owned(),
            hint: "set [bot] main_admin_id or the MAIN_ADMIN_ID env var to a non-zero user id"
                .to_owned(),
        });
    }

    if let Err(e) = url::Url::parse(&bot.welcome_animation_url) {
        return Err(ConfigError::Invalid {
            field: "bot.welcome_animation_url".to_owned(),
            message: e.to_string(),
        });
    }

    Ok(())
}

fn validate_transfer(config: &Config) -> ConfigResult<()> {
    let t = &config.transfer;

    if t.poll_interval_ms == 0 {
        return Err(ConfigError::Invalid {
            field: "transfer.poll_interval_ms".to_owned(),
            message: "must be greater than zero".to_owned(),
        });
    }

    if t.upload_timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            field: "transfer.upload_timeout_secs".to_owned(),
            message: "must be greater than zero".to_owned(),
        });
    }

    if t.bar_width == 0 || t.bar_width > MAX_BAR_WIDTH {
        return Err(ConfigError::Invalid {
            field: "transfer.bar_width".to_owned(),
            message: format!("must be between 1 and {MAX_BAR_WIDTH}"),
        });
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let format = config.logging.format.trim().to_ascii_lowercase();
    if !matches!(format.as_str(), "pretty" | "compact" | "json" | "full") {
        return Err(ConfigError::Invalid {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported format '{}'; expected one of: pretty, compact, json, full",
                config.logging.format
            ),
        });
    }
    Ok(())
}
