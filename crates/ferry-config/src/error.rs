use thiserror::Error;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value was not provided by any source.
    #[error("{field} is required: {hint}")]
    Missing {
        /// Dotted field path (e.g. `bot.token`).
        field: String,
        /// How to provide the value.
        hint: String,
    },

    /// A value was provided but is not acceptable.
    #[error("invalid value for {field}: {message}")]
    Invalid {
        /// Dotted field path.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The config file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    ReadError {
        /// File path.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected schema.
    #[error("failed to parse {path}: {source}")]
    ParseError {
        /// File path, or `<merged config>` after environment fallbacks.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// The config file exceeds the size limit.
    #[error("config file {path} is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge {
        /// File path.
        path: String,
        /// Actual size in bytes.
        size: u64,
        /// Maximum accepted size in bytes.
        limit: u64,
    },
}

/// Convenience alias.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_display_names_field_and_hint() {
        let err = ConfigError::Missing {
            field: "bot.token".to_owned(),
            hint: "set BOT_TOKEN".to_owned(),
        };
        assert_eq!(err.to_string(), "bot.token is required: set BOT_TOKEN");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConfigError>();
    }
}
