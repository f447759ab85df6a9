//! Data-fetch hints accumulated while columns prepare.
//!
//! Columns write named features into [`QueryOptions`]; the record store reads
//! the finished map once and treats absent keys as "not needed".

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Flag(bool),
    Number(i64),
    Text(String),
    Set(BTreeSet<String>),
}

impl QueryValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            QueryValue::Flag(flag) => *flag,
            QueryValue::Number(n) => *n != 0,
            QueryValue::Text(text) => !text.is_empty(),
            QueryValue::Set(set) => !set.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryOptions {
    values: BTreeMap<String, QueryValue>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flag(&mut self, key: &str) {
        self.values.insert(key.to_string(), QueryValue::Flag(true));
    }

    pub fn set_number(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), QueryValue::Number(value));
    }

    pub fn set_text(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), QueryValue::Text(value.to_string()));
    }

    /// Adds `member` to the set stored under `key`, replacing a scalar.
    pub fn add_to_set(&mut self, key: &str, member: &str) {
        let entry = self
            .values
            .entry(key.to_string())
            .or_insert_with(|| QueryValue::Set(BTreeSet::new()));
        match entry {
            QueryValue::Set(set) => {
                set.insert(member.to_string());
            }
            other => *other = QueryValue::Set(BTreeSet::from([member.to_string()])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.values.get(key)
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(QueryValue::is_truthy)
    }

    pub fn contains_member(&self, key: &str, member: &str) -> bool {
        matches!(self.values.get(key), Some(QueryValue::Set(set)) if set.contains(member))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_falsy_keys_are_not_set() {
        let mut options = QueryOptions::new();
        options.set_number("reviewer", 0);
        options.set_flag("tags");
        assert!(options.is_set("tags"));
        assert!(!options.is_set("reviewer"));
        assert!(!options.is_set("topics"));
    }

    #[test]
    fn sets_accumulate_members() {
        let mut options = QueryOptions::new();
        options.add_to_set("scores", "overAllMerit");
        options.add_to_set("scores", "novelty");
        options.add_to_set("scores", "novelty");
        assert!(options.contains_member("scores", "novelty"));
        assert_eq!(
            options.get("scores"),
            Some(&QueryValue::Set(BTreeSet::from([
                "novelty".to_string(),
                "overAllMerit".to_string()
            ])))
        );
    }
}
