use std::collections::BTreeSet;

use crate::model::key::QuestionKey;

/// Questions the learner bookmarked for later review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckedSet {
    keys: BTreeSet<QuestionKey>,
}

impl CheckedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: &QuestionKey) -> bool {
        self.keys.contains(key)
    }

    /// Returns true if the key was not already checked.
    pub fn insert(&mut self, key: QuestionKey) -> bool {
        self.keys.insert(key)
    }

    /// Returns true if the key was checked.
    pub fn remove(&mut self, key: &QuestionKey) -> bool {
        self.keys.remove(key)
    }

    /// Flip membership and return the new state.
    pub fn toggle(&mut self, key: &QuestionKey) -> bool {
        if self.keys.remove(key) {
            false
        } else {
            self.keys.insert(key.clone());
            true
        }
    }

    pub fn set(&mut self, key: &QuestionKey, checked: bool) {
        if checked {
            self.keys.insert(key.clone());
        } else {
            self.keys.remove(key);
        }
    }

    /// Union with another set.
    pub fn merge(&mut self, other: CheckedSet) {
        self.keys.extend(other.keys);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in round-major order.
    pub fn iter(&self) -> impl Iterator<Item = &QuestionKey> {
        self.keys.iter()
    }
}

impl FromIterator<QuestionKey> for CheckedSet {
    fn from_iter<I: IntoIterator<Item = QuestionKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
