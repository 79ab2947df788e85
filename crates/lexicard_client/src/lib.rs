//! Client side of Lexicard: HTTP access to the lesson server, fallback
//! provider chains and a driver that runs a [`Session`] against them.
//!
//! [`Session`]: lexicard_core::Session

/// Lesson API over HTTP.
pub mod api;
/// Client configuration from the environment.
pub mod config;
/// Session driver executing loads and persist effects.
pub mod driver;
/// Read/write provider chains.
pub mod provider;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use driver::{PersistReport, SessionDriver};
pub use provider::{DownloadSink, ReadChain, ReadProvider, Saved, WriteChain, WriteProvider};
