//! Small value types describing session view state.

use crate::naming::display_name;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which records the flashcard deck and table show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayFilter {
    /// Only records with `active == true`.
    #[default]
    Active,
    All,
}

impl DisplayFilter {
    pub fn admits(self, active: bool) -> bool {
        match self {
            DisplayFilter::Active => active,
            DisplayFilter::All => true,
        }
    }

    fn title_suffix(self) -> &'static str {
        match self {
            DisplayFilter::Active => "(Active Words)",
            DisplayFilter::All => "(All Words)",
        }
    }
}

/// Which side of a word pair is the card front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryLanguage {
    /// Headword first.
    #[default]
    Source,
    /// Translation first.
    Target,
}

/// What produced the session's current record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadedScope {
    SingleFile(String),
    MultiFile(Vec<String>),
    AllFiles,
}

impl LoadedScope {
    /// The lesson name when exactly one lesson is loaded.
    pub fn single_file(&self) -> Option<&str> {
        match self {
            LoadedScope::SingleFile(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Heading shown above the deck, e.g. `Lesson1 (Active Words)`.
    pub fn title(&self, filter: DisplayFilter) -> String {
        let base = match self {
            LoadedScope::SingleFile(name) => display_name(name),
            LoadedScope::MultiFile(names) => format!("Selected Files ({})", names.join(", ")),
            LoadedScope::AllFiles => "All Vocabulary Files".to_string(),
        };
        format!("{} {}", base, filter.title_suffix())
    }
}

/// How edits made under a multi-lesson scope reach disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistPolicy {
    /// Edits, deletes and toggles persist only while a single lesson is
    /// loaded; otherwise the owning lesson is marked unsaved.
    #[default]
    SingleFileOnly,
    /// Every mutation persists the record's own lesson, whatever the scope.
    PerRecordSource,
}

impl FromStr for PersistPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single-file" | "single" => Ok(PersistPolicy::SingleFileOnly),
            "per-record" | "record" => Ok(PersistPolicy::PerRecordSource),
            other => Err(format!(
                "unknown persist policy '{}' (expected single-file or per-record)",
                other
            )),
        }
    }
}

impl fmt::Display for PersistPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistPolicy::SingleFileOnly => f.write_str("single-file"),
            PersistPolicy::PerRecordSource => f.write_str("per-record"),
        }
    }
}

/// Flashcard navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A load the presentation layer wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Single(String),
    Multiple(Vec<String>),
    All,
    /// Drop every loaded record.
    Clear,
}

impl LoadRequest {
    /// Scope the request will produce, `None` for [`LoadRequest::Clear`].
    pub fn scope(&self) -> Option<LoadedScope> {
        match self {
            LoadRequest::Single(name) => Some(LoadedScope::SingleFile(name.clone())),
            LoadRequest::Multiple(names) => Some(LoadedScope::MultiFile(names.clone())),
            LoadRequest::All => Some(LoadedScope::AllFiles),
            LoadRequest::Clear => None,
        }
    }
}
