//! Side-effects and user notices emitted by session transitions.

use crate::constants::NOTICE_LIMIT;
use crate::error::SessionError;
use crate::models::{WordEntry, WordRecord};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// A complete lesson ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistBatch {
    file: String,
    entries: Vec<WordEntry>,
}

impl PersistBatch {
    /// Build a batch for `file` from its records.
    ///
    /// # Errors
    /// Returns [`SessionError::ForeignRecord`] if any record is owned by a
    /// different lesson.
    pub fn from_records<'a>(
        file: &str,
        records: impl IntoIterator<Item = &'a WordRecord>,
    ) -> Result<Self, SessionError> {
        let mut entries = Vec::new();
        for record in records {
            if record.source_file != file {
                return Err(SessionError::ForeignRecord {
                    record: record.id.to_string(),
                    expected: file.to_string(),
                    actual: record.source_file.clone(),
                });
            }
            entries.push(record.to_entry());
        }
        Ok(Self {
            file: file.to_string(),
            entries,
        })
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn into_parts(self) -> (String, Vec<WordEntry>) {
        (self.file, self.entries)
    }
}

/// Work a session transition asks its driver to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Overwrite a lesson with the batch's entries.
    Persist(PersistBatch),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warn,
    Error,
}

/// User-facing notification.
#[derive(Debug, Clone)]
pub struct Notice {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(severity: Severity, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: detail.into(),
            at: Utc::now(),
        }
    }

    fn same_message(&self, other: &Notice) -> bool {
        self.severity == other.severity
            && self.summary == other.summary
            && self.detail == other.detail
    }
}

/// Bounded notice queue; repeats of the newest notice are dropped.
#[derive(Debug, Default)]
pub struct NoticeQueue {
    items: VecDeque<Notice>,
}

impl NoticeQueue {
    pub fn push(&mut self, notice: Notice) {
        if self
            .items
            .back()
            .is_some_and(|last| last.same_message(&notice))
        {
            return;
        }
        self.items.push_back(notice);
        while self.items.len() > NOTICE_LIMIT {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.items.drain(..).collect()
    }
}
