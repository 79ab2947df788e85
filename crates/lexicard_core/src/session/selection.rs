//! Lesson picker state: plain clicks pick one lesson, extending clicks
//! toggle lessons in and out of a multi-selection.

use super::types::LoadRequest;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    names: Vec<String>,
}

impl FileSelection {
    /// Lessons currently in the multi-selection, in click order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Record a click on `name` and return the load it implies.
    pub fn select(&mut self, name: &str, extend: bool) -> LoadRequest {
        if !extend {
            self.names.clear();
            return LoadRequest::Single(name.to_string());
        }

        if let Some(pos) = self.names.iter().position(|existing| existing == name) {
            self.names.remove(pos);
        } else {
            self.names.push(name.to_string());
        }

        if self.names.is_empty() {
            LoadRequest::Clear
        } else {
            LoadRequest::Multiple(self.names.clone())
        }
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}
