//! Shared constants used across Lexicard crates.

/// Default API port for the lesson file server.
pub const DEFAULT_PORT: u16 = 3001;

/// Default maximum request body accepted by the save endpoint.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default base URL for CLI/API clients.
pub const DEFAULT_CLI_SERVER_URL: &str = "http://localhost:3001";

/// Default per-request timeout for client calls, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Default directory (relative to the working directory) for download fallbacks.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Extension used for lesson files in the store.
pub const LESSON_FILE_EXTENSION: &str = "json";

/// Lesson names offered when the file listing endpoint is unreachable.
pub const FALLBACK_LESSON_NAMES: &[&str] = &["lesson1", "lesson2", "lesson3", "lesson4", "lesson5"];

/// Maximum number of notices retained by a session.
pub const NOTICE_LIMIT: usize = 8;
