//! Client configuration loaded from `LEXICARD_*` environment variables.

use lexicard_core::config::{env_parsed, expand_tilde};
use lexicard_core::constants::{DEFAULT_DOWNLOAD_DIR, DEFAULT_REQUEST_TIMEOUT_SECS};
use lexicard_core::session::PersistPolicy;
use lexicard_core::DEFAULT_CLI_SERVER_URL;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Where lessons come from and go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the lesson server.
    pub server: String,
    /// Per-request timeout before a provider is skipped.
    pub timeout: Duration,
    /// Directory receiving lesson copies when the server cannot be reached.
    pub download_dir: PathBuf,
    pub persist_policy: PersistPolicy,
    /// Work directly on this lesson directory instead of talking to a server.
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: normalize_server(DEFAULT_CLI_SERVER_URL.to_string()),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            persist_policy: PersistPolicy::default(),
            data_dir: None,
        }
    }
}

fn non_blank(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl ClientConfig {
    /// Load configuration from the environment, falling back to defaults for
    /// anything missing or malformed.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let persist_policy = match non_blank("LEXICARD_PERSIST_POLICY") {
            Some(raw) => raw.parse().unwrap_or_else(|err: String| {
                tracing::warn!("Ignoring LEXICARD_PERSIST_POLICY: {}", err);
                defaults.persist_policy
            }),
            None => defaults.persist_policy,
        };
        Self {
            server: non_blank("LEXICARD_SERVER")
                .map(normalize_server)
                .unwrap_or(defaults.server),
            timeout: env_parsed::<u64>("LEXICARD_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            download_dir: non_blank("LEXICARD_DOWNLOAD_DIR")
                .map(|dir| PathBuf::from(expand_tilde(dir)))
                .unwrap_or(defaults.download_dir),
            persist_policy,
            data_dir: non_blank("LEXICARD_DATA_DIR").map(|dir| PathBuf::from(expand_tilde(dir))),
        }
    }
}

/// Canonicalize a server URL: `localhost` becomes `127.0.0.1` for plain HTTP
/// and trailing slashes are dropped. Unparseable input is returned unchanged.
pub fn normalize_server(server: String) -> String {
    if let Ok(mut url) = reqwest::Url::parse(&server) {
        let should_normalize_localhost =
            url.scheme().eq_ignore_ascii_case("http") && url.host_str() == Some("localhost");
        if should_normalize_localhost && url.set_host(Some("127.0.0.1")).is_err() {
            return server;
        }
        let mut normalized = url.to_string();
        while normalized.ends_with('/') {
            normalized.pop();
        }
        return normalized;
    }
    server
}
