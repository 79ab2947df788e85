//! Core domain library for Lexicard (config, lesson store, review session).

/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Environment mutation helpers for tests.
pub mod env;
/// Error types (storage/session).
pub mod error;
/// Data models for lesson files and the API.
pub mod models;
/// Lesson name validation.
pub mod naming;
/// In-memory review session.
pub mod session;
/// Directory-backed lesson store.
pub mod store;

pub use config::Config;
pub use constants::{DEFAULT_CLI_SERVER_URL, DEFAULT_PORT};
pub use error::{AppError, SessionError};
pub use session::Session;
pub use store::FileStore;
