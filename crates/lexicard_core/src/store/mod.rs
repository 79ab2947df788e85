//! Lesson file store: one pretty-printed JSON array per lesson on disk.

use crate::constants::LESSON_FILE_EXTENSION;
use crate::error::AppError;
use crate::models::WordEntry;
use crate::naming::{is_valid_lesson_name, validate_lesson_name};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};


/// Outcome of validating one stored lesson.
#[derive(Debug)]
pub struct LessonCheck {
    pub name: String,
    /// Entry count, or the reason the file could not be read.
    pub result: Result<usize, AppError>,
}

/// Directory-backed lesson storage.
///
/// Writes replace the whole file (write to a uniquely named temp sibling,
/// then rename). There is no locking; concurrent writers to one lesson race
/// and the last rename wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns [`AppError::StorageUnavailable`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| {
            AppError::io(&format!("Failed to create {}", root.display()), err)
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, AppError> {
        let name = validate_lesson_name(name)?;
        Ok(self
            .root
            .join(format!("{}.{}", name, LESSON_FILE_EXTENSION)))
    }

    /// List stored lesson names (no extension), sorted ascending.
    ///
    /// Files whose stem is not a valid lesson name are skipped.
    ///
    /// # Errors
    /// Returns [`AppError::StorageUnavailable`] if the directory cannot be read.
    pub fn list_files(&self) -> Result<Vec<String>, AppError> {
        let entries = fs::read_dir(&self.root)
            .map_err(|err| AppError::io("Failed to read lesson directory", err))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|err| AppError::io("Failed to read directory entry", err))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LESSON_FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if !is_valid_lesson_name(stem) || !path.is_file() {
                tracing::debug!("Skipping non-lesson entry {}", path.display());
                continue;
            }
            names.push(stem.to_string());
        }
        names.sort();
        Ok(names)
    }

    /// Read and parse one lesson.
    ///
    /// # Errors
    /// - [`AppError::InvalidName`] for a name outside `[A-Za-z0-9_-]+`.
    /// - [`AppError::NotFound`] when the file does not exist.
    /// - [`AppError::Corrupt`] when the content is not a JSON array of entries.
    /// - [`AppError::StorageUnavailable`] for other I/O failures.
    pub fn read_file(&self, name: &str) -> Result<Vec<WordEntry>, AppError> {
        let path = self.path_for(name)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound(name.to_string()))
            }
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                return Err(AppError::Corrupt {
                    name: name.to_string(),
                    reason: "file is not valid UTF-8".to_string(),
                })
            }
            Err(err) => return Err(AppError::io(&format!("Failed to read {}", name), err)),
        };
        parse_lesson(name, &raw)
    }

    /// Replace a lesson's content with `entries`.
    ///
    /// # Errors
    /// - [`AppError::InvalidName`] for a name outside `[A-Za-z0-9_-]+`.
    /// - [`AppError::StorageUnavailable`] if the file cannot be written.
    pub fn write_file(&self, name: &str, entries: &[WordEntry]) -> Result<(), AppError> {
        let path = self.path_for(name)?;
        let body = serde_json::to_string_pretty(entries)
            .map_err(|err| AppError::BadRequest(format!("Failed to encode {}: {}", name, err)))?;

        let context = format!("Failed to save {}", name);
        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", name))
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(|err| AppError::io(&context, err))?;
        temp.write_all(body.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|err| AppError::io(&context, err))?;
        temp.persist(&path)
            .map_err(|err| AppError::io(&context, err.error))?;

        tracing::info!("Saved {} ({} entries)", name, entries.len());
        Ok(())
    }

    /// Parse every stored lesson and report per-file results.
    ///
    /// # Errors
    /// Returns [`AppError::StorageUnavailable`] if the listing itself fails.
    pub fn check_all(&self) -> Result<Vec<LessonCheck>, AppError> {
        Ok(self
            .list_files()?
            .into_iter()
            .map(|name| {
                let result = self.read_file(&name).map(|entries| entries.len());
                LessonCheck { name, result }
            })
            .collect())
    }
}

/// Parse raw lesson JSON, mapping shape errors to [`AppError::Corrupt`].
pub fn parse_lesson(name: &str, raw: &str) -> Result<Vec<WordEntry>, AppError> {
    serde_json::from_str(raw).map_err(|err| AppError::Corrupt {
        name: name.to_string(),
        reason: err.to_string(),
    })
}
