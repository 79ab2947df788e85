//! Word-pair models: the on-disk entry and the session record.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One word pair as stored inside a lesson file.
///
/// Field names on the wire are `eng`, `rus` and `display` (`0`/`1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    #[serde(rename = "eng")]
    pub headword: String,
    #[serde(rename = "rus")]
    pub translation: String,
    #[serde(rename = "display", with = "display_flag")]
    pub active: bool,
}

impl WordEntry {
    pub fn new(headword: impl Into<String>, translation: impl Into<String>, active: bool) -> Self {
        Self {
            headword: headword.into(),
            translation: translation.into(),
            active,
        }
    }
}

/// Serializes `active` as the numeric `display` flag.
mod display_flag {
    use serde::de::{self, Deserializer, Unexpected, Visitor};
    use serde::Serializer;
    use std::fmt;

    pub fn serialize<S: Serializer>(active: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*active))
    }

    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("the number 0 or 1")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<bool, E> {
            match value {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(E::invalid_value(Unexpected::Unsigned(other), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<bool, E> {
            match value {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(E::invalid_value(Unexpected::Signed(other), &self)),
            }
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(FlagVisitor)
    }
}

/// Session-scoped identifier for a loaded word. Never written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A word pair decorated with its session id and owning lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordRecord {
    pub id: RecordId,
    pub headword: String,
    pub translation: String,
    pub active: bool,
    pub source_file: String,
}

impl WordRecord {
    /// Decorate a stored entry with a fresh id and its lesson name.
    pub fn from_entry(entry: WordEntry, source_file: &str) -> Self {
        Self {
            id: RecordId::new(),
            headword: entry.headword,
            translation: entry.translation,
            active: entry.active,
            source_file: source_file.to_string(),
        }
    }

    /// Strip session-only fields for persistence.
    pub fn to_entry(&self) -> WordEntry {
        WordEntry {
            headword: self.headword.clone(),
            translation: self.translation.clone(),
            active: self.active,
        }
    }
}
