//! Error types and the user-facing column message collector.

use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Collects user-facing messages raised while resolving columns.
///
/// Only messages at the highest priority seen are kept: a message with a
/// higher priority discards everything collected so far, one with the same
/// priority is appended, and one with a lower priority is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnErrors {
    messages: Vec<String>,
    priority: Option<i32>,
}

impl ColumnErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: impl Into<String>, priority: i32) {
        match self.priority {
            Some(current) if priority < current => {}
            Some(current) if priority == current => self.messages.push(message.into()),
            _ => {
                self.messages = vec![message.into()];
                self.priority = Some(priority);
            }
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Errors raised while registering columns.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("column name `{name}` is already registered")]
    DuplicateName { name: String },
    #[error("cannot add synonym for unknown column `{name}`")]
    UnknownSynonymTarget { name: String },
}

/// Errors that abort a listing.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("record store failed: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn higher_priority_replaces_lower() {
        let mut errors = ColumnErrors::new();
        errors.add("a", 1);
        errors.add("b", 2);
        errors.add("c", 1);
        errors.add("d", 2);
        assert_eq!(errors.messages(), ["b", "d"]);
        assert_eq!(errors.priority(), Some(2));
    }

    #[test]
    fn negative_priorities_are_ordinary() {
        let mut errors = ColumnErrors::new();
        errors.add("low", -1);
        assert_eq!(errors.messages(), ["low"]);
        errors.add("zero", 0);
        assert_eq!(errors.messages(), ["zero"]);
    }

    proptest! {
        #[test]
        fn only_the_highest_priority_survives(entries in proptest::collection::vec(-3i32..4, 1..24)) {
            let mut errors = ColumnErrors::new();
            for (index, priority) in entries.iter().enumerate() {
                errors.add(format!("m{index}"), *priority);
            }
            let top = entries.iter().copied().max().expect("non-empty");
            let expected: Vec<String> = entries
                .iter()
                .enumerate()
                .filter(|(_, priority)| **priority == top)
                .map(|(index, _)| format!("m{index}"))
                .collect();
            prop_assert_eq!(errors.priority(), Some(top));
            prop_assert_eq!(errors.messages(), expected.as_slice());
        }
    }
}
