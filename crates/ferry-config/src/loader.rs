//! Config file discovery and environment fallbacks.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Locate the config file (`$FERRY_CONFIG`, else `~/.ferry/config.toml`)
//! 2. Parse it into a TOML tree (an absent default file yields an empty tree)
//! 3. Apply environment variable fallbacks for fields the file leaves unset
//! 4. Deserialize the tree into [`Config`], filling the rest from defaults
//! 5. Validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "FERRY_CONFIG";

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// How an environment value is converted before it is merged.
#[derive(Debug, Clone, Copy)]
enum EnvKind {
    Str,
    Int,
    Bool,
}

/// Environment variables consulted for unset fields: `(var, dotted path, kind)`.
const ENV_FALLBACKS: &[(&str, &str, EnvKind)] = &[
    ("BOT_TOKEN", "bot.token", EnvKind::Str),
    ("MAIN_ADMIN_ID", "bot.main_admin_id", EnvKind::Int),
    ("WELCOME_ANIMATION_URL", "bot.welcome_animation_url", EnvKind::Str),
    ("DOCUMENT_AS_FILE", "bot.document_as_file", EnvKind::Bool),
    ("USE_THUMBNAIL", "bot.use_thumbnail", EnvKind::Bool),
    ("FERRY_LOG_LEVEL", "logging.level", EnvKind::Str),
    ("FERRY_LOG_FORMAT", "logging.format", EnvKind::Str),
    ("FERRY_LOG_DIR", "logging.directory", EnvKind::Str),
];

/// Where the config file is expected.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ConfigSource {
    path: PathBuf,
    /// Explicitly requested files must exist.
    required: bool,
}

/// Load configuration from the discovered file and the process environment.
///
/// # Errors
///
/// See [`load_with`].
pub fn load() -> ConfigResult<Config> {
    let env_vars = collect_env_vars();
    let source = discover(&env_vars);
    load_with(source.as_ref().map(|s| (s.path.as_path(), s.required)), &env_vars)
}

/// Load configuration from an optional file and an explicit environment map.
///
/// `file` is `(path, required)`; a missing file is an error only when
/// `required` is true.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is unreadable, too large or
/// malformed, an environment value cannot be converted, or the merged
/// configuration fails validation.
pub fn load_with(
    file: Option<(&Path, bool)>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<Config> {
    let mut merged = match file {
        Some((path, required)) => match try_load_file(path)? {
            Some(value) => {
                info!(path = %path.display(), "loaded config file");
                value
            },
            None if required => {
                return Err(ConfigError::ReadError {
                    path: path.display().to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            },
            None => empty_table(),
        },
        None => empty_table(),
    };

    let applied = apply_env_fallbacks(&mut merged, env_vars)?;
    if applied > 0 {
        debug!(count = applied, "applied environment variable fallbacks");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Snapshot the process environment.
fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Pick the config file location.
fn discover(env_vars: &HashMap<String, String>) -> Option<ConfigSource> {
    if let Some(explicit) = env_vars.get(CONFIG_PATH_ENV)
        && !explicit.trim().is_empty()
    {
        return Some(ConfigSource {
            path: PathBuf::from(explicit.trim()),
            required: true,
        });
    }

    directories::BaseDirs::new().map(|dirs| ConfigSource {
        path: dirs.home_dir().join(".ferry").join("config.toml"),
        required: false,
    })
}

fn empty_table() -> toml::Value {
    toml::Value::Table(toml::map::Map::new())
}

/// Try to load a file, returning `None` if the file doesn't exist.
///
/// Uses a single read operation so there is no separate exists check.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::TooLarge {
            path: path.display().to_string(),
            size,
            limit: MAX_CONFIG_FILE_SIZE,
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Fill unset fields from environment variables. Returns how many were applied.
fn apply_env_fallbacks(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<usize> {
    let mut applied: usize = 0;

    for &(var, path, kind) in ENV_FALLBACKS {
        let Some(raw) = env_vars.get(var) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }
        let Some((section, key)) = path.split_once('.') else {
            continue;
        };
        let Some(root) = merged.as_table_mut() else {
            continue;
        };
        let table = root
            .entry(section)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
        let Some(table) = table.as_table_mut() else {
            return Err(ConfigError::Invalid {
                field: section.to_owned(),
                message: "expected a table".to_owned(),
            });
        };
        if table.contains_key(key) {
            continue;
        }

        table.insert(key.to_owned(), convert_env_value(var, path, raw, kind)?);
        applied = applied.saturating_add(1);
    }

    Ok(applied)
}

fn convert_env_value(var: &str, path: &str, raw: &str, kind: EnvKind) -> ConfigResult<toml::Value> {
    match kind {
        EnvKind::Str => Ok(toml::Value::String(raw.to_owned())),
        EnvKind::Bool => Ok(toml::Value::Boolean(parse_flag(raw))),
        EnvKind::Int => raw
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(|n| i64::try_from(n).ok())
            .map(toml::Value::Integer)
            .ok_or_else(|| ConfigError::Invalid {
                field: path.to_owned(),
                message: format!("{var} must be a non-negative integer, got '{raw}'"),
            }),
    }
}

/// Boolean environment flags are true only for a case-insensitive `"true"`.
fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}
