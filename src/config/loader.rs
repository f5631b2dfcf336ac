//! Configuration file loading with precedence handling.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Poll intervals below this are clamped; re-reading the whole trace more
/// often than this is wasted work.
const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("Failed to read config file at {path:?}: {reason}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML.
    #[error("Invalid TOML in {path:?}: {reason}")]
    Parse {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/citv/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Default follow mode (re-read and re-parse the trace on an interval).
    #[serde(default)]
    pub follow: Option<bool>,

    /// Follow-mode poll interval in milliseconds.
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Follow mode.
    pub follow: bool,
    /// Poll interval in milliseconds, already clamped to the minimum.
    pub poll_interval_ms: u64,
    /// Path to log file for tracing output.
    pub log_file: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            follow: false,
            poll_interval_ms: 1000,
            log_file: default_log_path(),
        }
    }
}

/// Resolve default log file path.
///
/// `~/.local/state/citv/citv.log` on Unix-like systems, the platform
/// equivalent elsewhere, falling back to the current directory when no
/// state directory can be determined.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir().or_else(dirs::cache_dir) {
        state_dir.join("citv").join("citv.log")
    } else {
        PathBuf::from("citv.log")
    }
}

/// Resolve default config file path (`~/.config/citv/config.toml`).
///
/// Returns `None` if the platform config directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("citv").join("config.toml"))
}

/// Load a configuration file from a specific path.
///
/// Returns `Ok(None)` if the file doesn't exist (not an error - use
/// defaults).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Load configuration with path precedence.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `CITV_CONFIG` environment variable
/// 3. Default path `~/.config/citv/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns an error only if a config file exists but cannot be read or
/// parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var("CITV_CONFIG") {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge a config file into defaults to create a resolved config.
///
/// For each field, `Some(value)` wins over the default. The poll interval
/// is clamped to the minimum here so every later stage sees a sane value.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        follow: config.follow.unwrap_or(defaults.follow),
        poll_interval_ms: config
            .poll_interval_ms
            .unwrap_or(defaults.poll_interval_ms)
            .max(MIN_POLL_INTERVAL_MS),
        log_file: config.log_file.unwrap_or(defaults.log_file),
    }
}

/// Apply environment variable overrides.
///
/// - `CITV_FOLLOW`: `1`/`true` enable follow, `0`/`false` disable it
/// - `CITV_POLL_INTERVAL_MS`: poll interval (ignored if not a number)
/// - `CITV_LOG_FILE`: tracing output path
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(follow) = std::env::var("CITV_FOLLOW") {
        match follow.as_str() {
            "1" | "true" => config.follow = true,
            "0" | "false" => config.follow = false,
            _ => {}
        }
    }

    if let Ok(interval) = std::env::var("CITV_POLL_INTERVAL_MS") {
        if let Ok(ms) = interval.parse::<u64>() {
            config.poll_interval_ms = ms.max(MIN_POLL_INTERVAL_MS);
        }
    }

    if let Ok(path) = std::env::var("CITV_LOG_FILE") {
        config.log_file = PathBuf::from(path);
    }

    config
}

/// Apply CLI argument overrides.
///
/// CLI args have the highest precedence. Only flags the user explicitly
/// set are applied (a `None` leaves the previous stage's value alone).
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    follow_override: Option<bool>,
    poll_interval_override: Option<u64>,
) -> ResolvedConfig {
    if let Some(follow) = follow_override {
        config.follow = follow;
    }

    if let Some(ms) = poll_interval_override {
        config.poll_interval_ms = ms.max(MIN_POLL_INTERVAL_MS);
    }

    config
}
