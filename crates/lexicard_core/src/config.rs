//! Configuration loading from environment variables.

use crate::constants::{DEFAULT_MAX_BODY_SIZE, DEFAULT_PORT};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Runtime configuration for the lesson file server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding one `<name>.json` file per lesson.
    pub data_dir: String,
    /// Optional directory with page assets served at `/`.
    pub static_dir: Option<String>,
    pub port: u16,
    pub max_body_size: usize,
}

/// Expand tilde (~) in paths to the user's home directory
pub fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

/// Default lesson directory: `~/.local/share/lexicard/data`.
pub fn default_data_dir() -> String {
    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".local")
        .join("share")
        .join("lexicard")
        .join("data")
        .to_string_lossy()
        .to_string()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

/// Read and parse an environment variable, ignoring blank or malformed values.
pub fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var("DATA_DIR")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(expand_tilde)
                .unwrap_or_else(default_data_dir),
            static_dir: env::var("STATIC_DIR")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(expand_tilde),
            port: env_parsed("PORT").unwrap_or(DEFAULT_PORT),
            max_body_size: env_parsed("MAX_BODY_SIZE").unwrap_or(DEFAULT_MAX_BODY_SIZE),
        }
    }
}
