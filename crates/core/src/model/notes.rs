use std::collections::BTreeMap;

use crate::model::content::{decode_commas, encode_commas};
use crate::model::key::QuestionKey;

/// Outcome of writing a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteChange {
    Saved,
    Deleted,
}

/// Free-text explanations the learner jotted down per question.
///
/// Text is kept in its stored form (commas encoded as `_`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplanationNotes {
    notes: BTreeMap<QuestionKey, String>,
}

impl ExplanationNotes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a note exactly as persisted.
    pub fn insert_stored(&mut self, key: QuestionKey, stored: String) {
        self.notes.insert(key, stored);
    }

    /// Save user-written text; blank text removes the note.
    pub fn save(&mut self, key: QuestionKey, text: &str) -> NoteChange {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.notes.remove(&key);
            return NoteChange::Deleted;
        }
        self.notes.insert(key, encode_commas(trimmed));
        NoteChange::Saved
    }

    /// Display form of a note.
    #[must_use]
    pub fn get(&self, key: &QuestionKey) -> Option<String> {
        self.notes.get(key).map(|stored| decode_commas(stored))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Stored entries in round-major order.
    pub fn iter_stored(&self) -> impl Iterator<Item = (&QuestionKey, &str)> {
        self.notes.iter().map(|(key, text)| (key, text.as_str()))
    }

    /// Human-readable dump, one block per note, sorted by round and then
    /// question number. Returns `None` when there is nothing to export.
    #[must_use]
    pub fn export_text(&self) -> Option<String> {
        if self.notes.is_empty() {
            return None;
        }
        let blocks: Vec<String> = self
            .notes
            .iter()
            .map(|(key, text)| {
                format!(
                    "Round: {}, Question: {}, Explanation: {}",
                    key.round(),
                    key.number(),
                    text
                )
            })
            .collect();
        Some(blocks.join("\n\n"))
    }
}
