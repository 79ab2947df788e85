//! Data models for lesson files, session records and API bodies.

/// API response/error bodies.
pub mod api;
/// Word entries and session records.
pub mod word;


pub use word::{RecordId, WordEntry, WordRecord};
