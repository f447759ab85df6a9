use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contact::Contact;
use crate::ids::ContactId;

/// Search limit naming the viewer's own submissions.
pub const LIMIT_AUTHOR: &str = "a";

/// The search that produced a listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchContext {
    /// Collection the search is limited to, e.g. `"s"` or `"a"`.
    pub limit: String,
    /// Reviewer the search is about, when it names one other than the viewer.
    pub reviewer: Option<Contact>,
    /// Regex per searchable field (`title`, `abstract`, `authors`, `collaborators`).
    pub match_patterns: BTreeMap<String, String>,
    /// Tags the search wants highlighted.
    pub highlight_tags: Vec<String>,
    /// The search splits results into groups.
    pub thenmap: bool,
}

impl SearchContext {
    pub fn with_limit(mut self, limit: &str) -> Self {
        self.limit = limit.to_string();
        self
    }

    pub fn with_reviewer(mut self, reviewer: Contact) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    pub fn with_match(mut self, field: &str, pattern: &str) -> Self {
        self.match_patterns
            .insert(field.to_string(), pattern.to_string());
        self
    }

    pub fn is_author_limit(&self) -> bool {
        self.limit == LIMIT_AUTHOR
    }

    pub fn reviewer_cid(&self) -> Option<ContactId> {
        self.reviewer.as_ref().map(|reviewer| reviewer.contact_id)
    }
}
