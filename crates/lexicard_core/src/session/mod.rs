//! In-memory review session: loaded records, derived views and edits.
//!
//! [`Session`] never performs I/O. Loads are split into [`Session::begin_load`]
//! and [`Session::finish_load`] so the caller can fetch lessons however it
//! likes, and mutations return [`Effect`]s describing the lesson writes they
//! require.

mod effects;
mod selection;
mod types;

#[cfg(test)]
mod tests;

pub use effects::{Effect, Notice, NoticeQueue, PersistBatch, Severity};
pub use selection::FileSelection;
pub use types::{
    Direction, DisplayFilter, LoadRequest, LoadedScope, PersistPolicy, PrimaryLanguage,
};

use crate::error::{AppError, SessionError};
use crate::models::{RecordId, WordEntry, WordRecord};
use crate::naming::is_valid_lesson_name;
use std::collections::BTreeSet;

/// Stamp identifying one load request; only the newest ticket may apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    scope: LoadedScope,
}

impl LoadTicket {
    pub fn scope(&self) -> &LoadedScope {
        &self.scope
    }
}

/// Fetch result for one lesson within a load.
#[derive(Debug)]
pub struct FileBatch {
    pub name: String,
    pub result: Result<Vec<WordEntry>, AppError>,
}

impl FileBatch {
    pub fn loaded(name: impl Into<String>, entries: Vec<WordEntry>) -> Self {
        Self {
            name: name.into(),
            result: Ok(entries),
        }
    }

    pub fn failed(name: impl Into<String>, err: AppError) -> Self {
        Self {
            name: name.into(),
            result: Err(err),
        }
    }
}

/// Summary of an applied load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    /// `(lesson, reason)` for every lesson that could not be read.
    pub failed: Vec<(String, String)>,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(LoadReport),
    /// Every requested lesson failed; records and scope are unchanged.
    Failed(LoadReport),
    /// A newer load was started after this ticket; nothing changed.
    Stale,
}

/// The card under the cursor, resolved against the primary language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardFace<'a> {
    pub record: &'a WordRecord,
    pub front: &'a str,
    pub back: &'a str,
    pub revealed: bool,
    /// Zero-based position within the visible deck.
    pub position: usize,
    pub total: usize,
}

/// User intents accepted by [`Session::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    SetDisplayFilter(DisplayFilter),
    Add {
        headword: String,
        translation: String,
        active: bool,
        target_file: String,
    },
    Edit {
        id: RecordId,
        headword: String,
        translation: String,
        active: bool,
    },
    Delete(RecordId),
    ToggleActive(RecordId),
    ToggleCurrent,
    Advance(Direction),
    Reveal,
    SetPrimaryLanguage(PrimaryLanguage),
    Search(String),
    ClearSearch,
}

/// Review session state.
#[derive(Debug, Default)]
pub struct Session {
    records: Vec<WordRecord>,
    /// Indices into `records`, recomputed from `display_filter`.
    visible: Vec<usize>,
    display_filter: DisplayFilter,
    scope: Option<LoadedScope>,
    cursor: usize,
    revealed: bool,
    primary_language: PrimaryLanguage,
    search: Option<String>,
    persist_policy: PersistPolicy,
    selection: FileSelection,
    unsaved: BTreeSet<String>,
    generation: u64,
    notices: NoticeQueue,
}

fn fold_key(value: &str) -> String {
    value.trim().to_lowercase()
}

fn required_text(headword: &str, translation: &str) -> Result<(String, String), SessionError> {
    let headword = headword.trim();
    let translation = translation.trim();
    if headword.is_empty() || translation.is_empty() {
        return Err(SessionError::Validation(
            "Both the word and its translation are required".to_string(),
        ));
    }
    Ok((headword.to_string(), translation.to_string()))
}

impl Session {
    pub fn new(persist_policy: PersistPolicy) -> Self {
        Self {
            persist_policy,
            ..Self::default()
        }
    }

    /// Every loaded record, in load order.
    pub fn records(&self) -> &[WordRecord] {
        &self.records
    }

    /// Records admitted by the display filter, in load order.
    pub fn visible_records(&self) -> Vec<&WordRecord> {
        self.visible.iter().map(|&idx| &self.records[idx]).collect()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Visible records narrowed by the table search query.
    pub fn table_rows(&self) -> Vec<&WordRecord> {
        let Some(needle) = self.search.as_deref().map(str::to_lowercase) else {
            return self.visible_records();
        };
        self.visible
            .iter()
            .map(|&idx| &self.records[idx])
            .filter(|record| {
                record.headword.to_lowercase().contains(&needle)
                    || record.translation.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn record(&self, id: RecordId) -> Option<&WordRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn display_filter(&self) -> DisplayFilter {
        self.display_filter
    }

    pub fn primary_language(&self) -> PrimaryLanguage {
        self.primary_language
    }

    pub fn scope(&self) -> Option<&LoadedScope> {
        self.scope.as_ref()
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn persist_policy(&self) -> PersistPolicy {
        self.persist_policy
    }

    pub fn selection(&self) -> &FileSelection {
        &self.selection
    }

    /// Lessons changed in memory but not written (multi-lesson scope under
    /// [`PersistPolicy::SingleFileOnly`]).
    pub fn unsaved_files(&self) -> impl Iterator<Item = &str> {
        self.unsaved.iter().map(String::as_str)
    }

    pub fn notices(&self) -> &NoticeQueue {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn notify(&mut self, severity: Severity, summary: &str, detail: impl Into<String>) {
        self.notices.push(Notice::new(severity, summary, detail));
    }

    /// Heading for the current scope, or `None` when nothing is loaded.
    pub fn display_title(&self) -> Option<String> {
        self.scope
            .as_ref()
            .map(|scope| scope.title(self.display_filter))
    }

    pub fn current_card(&self) -> Option<CardFace<'_>> {
        let record = &self.records[*self.visible.get(self.cursor)?];
        let (front, back) = match self.primary_language {
            PrimaryLanguage::Source => (record.headword.as_str(), record.translation.as_str()),
            PrimaryLanguage::Target => (record.translation.as_str(), record.headword.as_str()),
        };
        Some(CardFace {
            record,
            front,
            back,
            revealed: self.revealed,
            position: self.cursor,
            total: self.visible.len(),
        })
    }

    fn current_id(&self) -> Option<RecordId> {
        self.visible
            .get(self.cursor)
            .map(|&idx| self.records[idx].id)
    }

    fn index_of(&self, id: RecordId) -> Result<usize, SessionError> {
        self.records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| SessionError::UnknownRecord(id.to_string()))
    }

    /// Start a load for `scope`, invalidating any load still in flight.
    pub fn begin_load(&mut self, scope: LoadedScope) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
            scope,
        }
    }

    /// Replace the record set with the batches fetched for `ticket`.
    ///
    /// Failed batches are reported and skipped. When every batch failed the
    /// session is left as it was. A ticket superseded by a later
    /// [`Session::begin_load`] or [`Session::clear`] is discarded.
    pub fn finish_load(&mut self, ticket: LoadTicket, batches: Vec<FileBatch>) -> LoadOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding stale load {} (current {})",
                ticket.generation,
                self.generation
            );
            return LoadOutcome::Stale;
        }

        let mut report = LoadReport::default();
        let mut records = Vec::new();
        for batch in batches {
            match batch.result {
                Ok(entries) => {
                    records.extend(
                        entries
                            .into_iter()
                            .map(|entry| WordRecord::from_entry(entry, &batch.name)),
                    );
                    report.loaded.push(batch.name);
                }
                Err(err) => {
                    tracing::warn!("Skipping lesson {}: {}", batch.name, err);
                    self.notices.push(Notice::new(
                        Severity::Warn,
                        "Lesson unavailable",
                        format!("{}: {}", batch.name, err),
                    ));
                    report.failed.push((batch.name, err.to_string()));
                }
            }
        }
        report.record_count = records.len();

        if report.loaded.is_empty() && !report.failed.is_empty() {
            tracing::warn!("No lesson could be loaded; keeping the current session");
            self.notices.push(Notice::new(
                Severity::Error,
                "Load failed",
                "Nothing was loaded; the previous view is unchanged",
            ));
            return LoadOutcome::Failed(report);
        }

        if !self.unsaved.is_empty() {
            tracing::warn!(
                "Replacing session with unsaved changes in {:?}",
                self.unsaved
            );
            self.unsaved.clear();
        }

        self.records = records;
        self.scope = Some(ticket.scope);
        self.recompute_visible();
        self.cursor = 0;
        self.revealed = false;

        self.notices.push(Notice::new(
            Severity::Info,
            "Loaded",
            format!(
                "{} words from {} lesson(s)",
                report.record_count,
                report.loaded.len()
            ),
        ));
        LoadOutcome::Applied(report)
    }

    /// Drop all records and cancel any pending load.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.records.clear();
        self.visible.clear();
        self.scope = None;
        self.cursor = 0;
        self.revealed = false;
        self.unsaved.clear();
        self.selection.clear();
    }

    /// Register a lesson-picker click; the caller performs the returned load.
    pub fn select_file(&mut self, name: &str, extend: bool) -> LoadRequest {
        self.selection.select(name, extend)
    }

    fn recompute_visible(&mut self) {
        let filter = self.display_filter;
        self.visible = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| filter.admits(record.active))
            .map(|(idx, _)| idx)
            .collect();
    }

    /// Recompute the view after an in-place mutation, keeping the cursor in
    /// bounds and hiding the back face if a different card moved under it.
    fn refresh_after_mutation(&mut self, previous: Option<RecordId>) {
        self.recompute_visible();
        self.cursor = self.cursor.min(self.visible.len().saturating_sub(1));
        if self.current_id() != previous {
            self.revealed = false;
        }
    }

    pub fn set_display_filter(&mut self, filter: DisplayFilter) {
        self.display_filter = filter;
        self.recompute_visible();
        self.cursor = 0;
        self.revealed = false;
    }

    pub fn advance_card(&mut self, direction: Direction) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        self.revealed = false;
        self.cursor = match direction {
            Direction::Forward => (self.cursor + 1) % len,
            Direction::Backward => (self.cursor + len - 1) % len,
        };
    }

    pub fn reveal_card(&mut self) {
        self.revealed = !self.revealed;
    }

    pub fn set_primary_language(&mut self, language: PrimaryLanguage) {
        self.primary_language = language;
        self.revealed = false;
    }

    /// Set the table search query; blank input clears it.
    pub fn set_search(&mut self, query: &str) {
        let trimmed = query.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    pub fn clear_search(&mut self) {
        self.search = None;
    }

    fn persist_batch(&self, file: &str) -> Result<PersistBatch, SessionError> {
        PersistBatch::from_records(
            file,
            self.records
                .iter()
                .filter(|record| record.source_file == file),
        )
    }

    /// Effects for a change to a record owned by `file`, honoring the
    /// persist policy.
    fn persist_after_change(&mut self, file: &str) -> Result<Vec<Effect>, SessionError> {
        let single = self
            .scope
            .as_ref()
            .and_then(LoadedScope::single_file)
            .is_some();
        if single || self.persist_policy == PersistPolicy::PerRecordSource {
            self.unsaved.remove(file);
            return Ok(vec![Effect::Persist(self.persist_batch(file)?)]);
        }
        self.unsaved.insert(file.to_string());
        self.notices.push(Notice::new(
            Severity::Info,
            "Not saved",
            format!("Changes to {} are kept in memory only", file),
        ));
        Ok(Vec::new())
    }

    /// Explicitly write one lesson's current records (clears its unsaved mark).
    ///
    /// # Errors
    /// Returns [`SessionError::Validation`] if no loaded record belongs to `file`
    /// and the lesson is not marked unsaved.
    pub fn persist_file(&mut self, file: &str) -> Result<Effect, SessionError> {
        let known = self.unsaved.contains(file)
            || self.records.iter().any(|record| record.source_file == file);
        if !known {
            return Err(SessionError::Validation(format!(
                "Lesson '{}' is not loaded",
                file
            )));
        }
        self.unsaved.remove(file);
        Ok(Effect::Persist(self.persist_batch(file)?))
    }

    /// Flag `file` as holding changes that never reached storage.
    pub fn mark_unsaved(&mut self, file: &str) {
        self.unsaved.insert(file.to_string());
    }

    /// Append a new word to `target_file`.
    ///
    /// The target must be the single loaded lesson; adding while several
    /// lessons (or none) are loaded is rejected, since the write would replace
    /// the lesson with a partial record set.
    ///
    /// # Errors
    /// - [`SessionError::Validation`] for blank text, a missing/invalid target,
    ///   or a non single-lesson scope.
    /// - [`SessionError::Duplicate`] when the lesson already has the pair
    ///   (case-insensitive, surrounding whitespace ignored).
    pub fn add_record(
        &mut self,
        headword: &str,
        translation: &str,
        active: bool,
        target_file: &str,
    ) -> Result<(RecordId, Vec<Effect>), SessionError> {
        let (headword, translation) = required_text(headword, translation)?;
        let target_file = target_file.trim();
        if target_file.is_empty() {
            return Err(SessionError::Validation(
                "Choose a lesson for the new word".to_string(),
            ));
        }
        if !is_valid_lesson_name(target_file) {
            return Err(SessionError::Validation(format!(
                "'{}' is not a valid lesson name",
                target_file
            )));
        }
        match self.scope.as_ref() {
            Some(LoadedScope::SingleFile(loaded)) if loaded == target_file => {}
            Some(LoadedScope::SingleFile(loaded)) => {
                return Err(SessionError::Validation(format!(
                    "'{}' is loaded; open '{}' to add words to it",
                    loaded, target_file
                )))
            }
            Some(_) => {
                return Err(SessionError::Validation(
                    "Select a single lesson before adding words".to_string(),
                ))
            }
            None => {
                return Err(SessionError::Validation(
                    "Load a lesson before adding words".to_string(),
                ))
            }
        }

        let (head_key, trans_key) = (fold_key(&headword), fold_key(&translation));
        let duplicate = self.records.iter().any(|record| {
            record.source_file == target_file
                && fold_key(&record.headword) == head_key
                && fold_key(&record.translation) == trans_key
        });
        if duplicate {
            return Err(SessionError::Duplicate {
                headword,
                translation,
                file: target_file.to_string(),
            });
        }

        let previous = self.current_id();
        let record = WordRecord {
            id: RecordId::new(),
            headword,
            translation,
            active,
            source_file: target_file.to_string(),
        };
        let id = record.id;
        self.records.push(record);
        self.refresh_after_mutation(previous);

        let effects = self.persist_after_change(target_file)?;
        self.notices
            .push(Notice::new(Severity::Success, "Added", "New word added"));
        Ok((id, effects))
    }

    /// Replace a record's text and flag in place.
    ///
    /// # Errors
    /// [`SessionError::UnknownRecord`] or [`SessionError::Validation`].
    pub fn edit_record(
        &mut self,
        id: RecordId,
        headword: &str,
        translation: &str,
        active: bool,
    ) -> Result<Vec<Effect>, SessionError> {
        let idx = self.index_of(id)?;
        let (headword, translation) = required_text(headword, translation)?;

        let previous = self.current_id();
        let record = &mut self.records[idx];
        record.headword = headword;
        record.translation = translation;
        record.active = active;
        let file = record.source_file.clone();
        self.refresh_after_mutation(previous);

        let effects = self.persist_after_change(&file)?;
        self.notices
            .push(Notice::new(Severity::Success, "Updated", "Word updated"));
        Ok(effects)
    }

    /// Remove a record.
    ///
    /// # Errors
    /// [`SessionError::UnknownRecord`] when `id` is not loaded.
    pub fn delete_record(&mut self, id: RecordId) -> Result<Vec<Effect>, SessionError> {
        let idx = self.index_of(id)?;
        let previous = self.current_id();
        let removed = self.records.remove(idx);
        self.refresh_after_mutation(previous);

        let effects = self.persist_after_change(&removed.source_file)?;
        self.notices
            .push(Notice::new(Severity::Success, "Deleted", "Word deleted"));
        Ok(effects)
    }

    /// Flip a record between active and inactive; returns the new state.
    ///
    /// # Errors
    /// [`SessionError::UnknownRecord`] when `id` is not loaded.
    pub fn toggle_active(&mut self, id: RecordId) -> Result<(bool, Vec<Effect>), SessionError> {
        let idx = self.index_of(id)?;
        let previous = self.current_id();
        let record = &mut self.records[idx];
        record.active = !record.active;
        let active = record.active;
        let file = record.source_file.clone();
        let headword = record.headword.clone();
        self.refresh_after_mutation(previous);

        let effects = self.persist_after_change(&file)?;
        self.notices.push(Notice::new(
            Severity::Info,
            "Status Changed",
            format!(
                "Word \"{}\" is now {}",
                headword,
                if active { "Active" } else { "Inactive" }
            ),
        ));
        Ok((active, effects))
    }

    /// Toggle the record under the cursor, if any.
    pub fn toggle_current(&mut self) -> Result<Vec<Effect>, SessionError> {
        match self.current_id() {
            Some(id) => self.toggle_active(id).map(|(_, effects)| effects),
            None => Ok(Vec::new()),
        }
    }

    /// Dispatch an action; rejections are also queued as notices.
    pub fn apply(&mut self, action: SessionAction) -> Result<Vec<Effect>, SessionError> {
        let result = match action {
            SessionAction::SetDisplayFilter(filter) => {
                self.set_display_filter(filter);
                Ok(Vec::new())
            }
            SessionAction::Add {
                headword,
                translation,
                active,
                target_file,
            } => self
                .add_record(&headword, &translation, active, &target_file)
                .map(|(_, effects)| effects),
            SessionAction::Edit {
                id,
                headword,
                translation,
                active,
            } => self.edit_record(id, &headword, &translation, active),
            SessionAction::Delete(id) => self.delete_record(id),
            SessionAction::ToggleActive(id) => {
                self.toggle_active(id).map(|(_, effects)| effects)
            }
            SessionAction::ToggleCurrent => self.toggle_current(),
            SessionAction::Advance(direction) => {
                self.advance_card(direction);
                Ok(Vec::new())
            }
            SessionAction::Reveal => {
                self.reveal_card();
                Ok(Vec::new())
            }
            SessionAction::SetPrimaryLanguage(language) => {
                self.set_primary_language(language);
                Ok(Vec::new())
            }
            SessionAction::Search(query) => {
                self.set_search(&query);
                Ok(Vec::new())
            }
            SessionAction::ClearSearch => {
                self.clear_search();
                Ok(Vec::new())
            }
        };

        if let Err(err) = &result {
            let severity = match err {
                SessionError::ForeignRecord { .. } => Severity::Error,
                _ => Severity::Warn,
            };
            self.notices
                .push(Notice::new(severity, "Warning", err.to_string()));
        }
        result
    }
}
