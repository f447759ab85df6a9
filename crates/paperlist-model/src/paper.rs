//! Submission records as delivered by the record store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contact::Contact;
use crate::ids::{ContactId, PaperId};
use crate::tags;

pub const REVIEW_EXTERNAL: i32 = 1;
pub const REVIEW_PC: i32 = 2;
pub const REVIEW_SECONDARY: i32 = 3;
pub const REVIEW_PRIMARY: i32 = 4;

/// Conflict types at or above this value mark the contact as an author.
pub const CONFLICT_AUTHOR: i32 = 9;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub affiliation: String,
}

impl Author {
    pub fn full_name(&self) -> String {
        if self.first_name.is_empty() && self.last_name.is_empty() {
            self.email.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string()
        }
    }

    /// "A. Lovelace" style abbreviation.
    pub fn abbreviated_name(&self) -> String {
        match self.first_name.chars().next() {
            Some(initial) if !self.last_name.is_empty() => {
                format!("{initial}. {}", self.last_name)
            }
            _ => self.full_name(),
        }
    }
}

/// One review assignment on a submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewRow {
    pub review_id: u32,
    pub contact_id: ContactId,
    pub review_type: i32,
    pub submitted: bool,
    /// Review has been started but not submitted.
    pub modified: bool,
    pub needs_submit: bool,
    pub ordinal: u32,
    pub round: Option<String>,
    pub requested_by: Option<ContactId>,
    pub reviewer_first_name: String,
    pub reviewer_last_name: String,
    pub reviewer_email: String,
    pub reviewer_last_login: i64,
    /// Numeric score per review field id.
    pub scores: BTreeMap<String, i32>,
}

impl ReviewRow {
    pub fn reviewer_name(&self) -> String {
        let name = format!("{} {}", self.reviewer_first_name, self.reviewer_last_name);
        let name = name.trim();
        if name.is_empty() {
            self.reviewer_email.clone()
        } else {
            name.to_string()
        }
    }

    pub fn is_started(&self) -> bool {
        self.submitted || self.modified
    }
}

/// A reviewer's stated preference for a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preference {
    pub value: i32,
    /// Self-reported expertise: 2 (expert), 1 (knowledgeable), 0 (none).
    pub expertise: Option<i32>,
}

impl Preference {
    pub fn is_empty(&self) -> bool {
        self.value == 0 && self.expertise.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperRow {
    pub paper_id: PaperId,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<Author>,
    pub collaborators: String,
    pub outcome: i32,
    pub time_submitted: i64,
    pub time_withdrawn: i64,
    pub time_final_submitted: i64,
    pub paper_storage_id: i64,
    pub lead_contact_id: Option<ContactId>,
    pub shepherd_contact_id: Option<ContactId>,
    /// Stored tag string, see [`crate::tags`].
    pub paper_tags: String,
    pub topic_ids: Vec<u32>,
    /// Conflict type per contact; absent means no conflict.
    pub conflicts: BTreeMap<ContactId, i32>,
    pub reviews: Vec<ReviewRow>,
    pub preferences: BTreeMap<ContactId, Preference>,
    pub desirability: i64,
}

impl PaperRow {
    pub fn new(paper_id: u32, title: &str) -> Self {
        Self {
            paper_id: PaperId(paper_id),
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn conflict_type(&self, contact: ContactId) -> i32 {
        self.conflicts.get(&contact).copied().unwrap_or(0)
    }

    pub fn is_author(&self, contact: ContactId) -> bool {
        self.conflict_type(contact) >= CONFLICT_AUTHOR
    }

    pub fn review_by(&self, contact: ContactId) -> Option<&ReviewRow> {
        self.reviews.iter().find(|review| review.contact_id == contact)
    }

    pub fn review_type(&self, contact: ContactId) -> i32 {
        self.review_by(contact).map_or(0, |review| review.review_type)
    }

    pub fn num_reviews_submitted(&self) -> usize {
        self.reviews.iter().filter(|review| review.submitted).count()
    }

    pub fn num_reviews_started(&self) -> usize {
        self.reviews.iter().filter(|review| review.is_started()).count()
    }

    pub fn preference(&self, contact: ContactId) -> Preference {
        self.preferences.get(&contact).copied().unwrap_or_default()
    }

    pub fn topic_interest_score(&self, contact: &Contact) -> i32 {
        self.topic_ids
            .iter()
            .filter_map(|topic| contact.topic_interest.get(topic))
            .sum()
    }

    pub fn tag_value(&self, tag: &str) -> Option<i64> {
        tags::find_tag_value(&self.paper_tags, tag)
    }

    pub fn is_submitted(&self) -> bool {
        self.time_submitted > 0
    }

    pub fn is_withdrawn(&self) -> bool {
        self.time_withdrawn > 0
    }

    /// Latest of the final-version and initial submission times.
    pub fn latest_submission_time(&self) -> i64 {
        self.time_final_submitted.max(self.time_submitted).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reviewed_paper() -> PaperRow {
        let mut paper = PaperRow::new(4, "Consensus at Scale");
        paper.reviews = vec![
            ReviewRow {
                contact_id: ContactId(10),
                review_type: REVIEW_PRIMARY,
                submitted: true,
                ..ReviewRow::default()
            },
            ReviewRow {
                contact_id: ContactId(11),
                review_type: REVIEW_SECONDARY,
                modified: true,
                ..ReviewRow::default()
            },
            ReviewRow {
                contact_id: ContactId(12),
                review_type: REVIEW_PC,
                ..ReviewRow::default()
            },
        ];
        paper.conflicts.insert(ContactId(20), CONFLICT_AUTHOR);
        paper
    }

    #[test]
    fn review_counts() {
        let paper = reviewed_paper();
        assert_eq!(paper.num_reviews_submitted(), 1);
        assert_eq!(paper.num_reviews_started(), 2);
        assert_eq!(paper.review_type(ContactId(11)), REVIEW_SECONDARY);
        assert_eq!(paper.review_type(ContactId(99)), 0);
    }

    #[test]
    fn authorship_follows_conflict_type() {
        let paper = reviewed_paper();
        assert!(paper.is_author(ContactId(20)));
        assert!(!paper.is_author(ContactId(10)));
    }

    #[test]
    fn topic_interest_sums_known_topics() {
        let mut paper = reviewed_paper();
        paper.topic_ids = vec![1, 2, 3];
        let mut contact = Contact::new(10, "Grace", "Hopper");
        contact.topic_interest.insert(1, 2);
        contact.topic_interest.insert(3, -1);
        assert_eq!(paper.topic_interest_score(&contact), 1);
    }

    #[test]
    fn deserializes_from_json_with_abstract_key() {
        let json = r#"{
            "paper_id": 7,
            "title": "Tagged",
            "abstract": "About tags.",
            "paper_tags": " urgent#0",
            "conflicts": {"3": 9}
        }"#;
        let paper: PaperRow = serde_json::from_str(json).expect("parse paper");
        assert_eq!(paper.abstract_text, "About tags.");
        assert_eq!(paper.tag_value("urgent"), Some(0));
        assert!(paper.is_author(ContactId(3)));
    }
}
