//! Lesson HTTP handlers.

use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use lexicard_core::models::{api::SaveResponse, WordEntry};
use lexicard_core::naming::validate_lesson_name;

/// List stored lesson names, sorted.
///
/// # Errors
/// Returns an error if the lesson directory cannot be read.
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<String>>, HttpError> {
    let names = state.store.list_files()?;
    Ok(Json(names))
}

/// Fetch a lesson's entries.
///
/// # Arguments
/// - `state`: Application state.
/// - `name`: Lesson name from the path.
///
/// # Returns
/// The lesson's entries as a JSON array.
///
/// # Errors
/// Returns an error for invalid names, missing lessons, or corrupt files.
pub async fn read_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<WordEntry>>, HttpError> {
    let entries = state.store.read_file(&name)?;
    Ok(Json(entries))
}

/// Replace a lesson's entries with the request body.
///
/// The name is validated before the body so traversal attempts are reported
/// as such even when the payload is also malformed.
///
/// # Errors
/// Returns an error for invalid names, malformed bodies, or failed writes.
pub async fn save_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<Vec<WordEntry>>, JsonRejection>,
) -> Result<Json<SaveResponse>, HttpError> {
    validate_lesson_name(&name)?;
    let Json(entries) =
        body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    state.store.write_file(&name, &entries)?;
    tracing::info!("Successfully updated {}.json", name);
    Ok(Json(SaveResponse {
        success: true,
        message: format!("{}.json updated successfully", name),
    }))
}
