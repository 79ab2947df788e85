//! Lesson file-name rules.
//!
//! A lesson name is the file's base name without extension and may only
//! contain ASCII letters, digits, `_` and `-`. Anything else (dots, slashes,
//! spaces) is rejected so names can never escape the data directory.

use crate::error::AppError;

/// Return `true` when `name` is a non-empty `[A-Za-z0-9_-]+` string.
pub fn is_valid_lesson_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Validate a lesson name.
///
/// # Errors
/// Returns [`AppError::InvalidName`] when the name fails [`is_valid_lesson_name`].
pub fn validate_lesson_name(name: &str) -> Result<&str, AppError> {
    if is_valid_lesson_name(name) {
        Ok(name)
    } else {
        Err(AppError::InvalidName(name.to_string()))
    }
}

/// Human-facing form of a lesson name (`lesson1` -> `Lesson1`).
pub fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
