//! Conference-wide settings loaded from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contact::Contact;
use crate::ids::ContactId;
use crate::view_score::ViewScore;

/// Errors raised while loading [`ConferenceSettings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: u32,
    pub name: String,
}

/// A named decision outcome. Positive ids are acceptances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub id: i32,
    pub name: String,
}

/// A review form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewField {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    /// Score labels, lowest first; empty for free-text fields.
    pub options: Vec<String>,
    pub view_score: ViewScore,
    /// Position on the review form; `None` hides the field.
    pub display_order: Option<u32>,
}

impl Default for ReviewField {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            abbreviation: String::new(),
            options: Vec::new(),
            view_score: ViewScore::PC,
            display_order: Some(0),
        }
    }
}

impl ReviewField {
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn max_score(&self) -> usize {
        self.options.len()
    }

    /// Abbreviation, or the name when no abbreviation was configured.
    pub fn web_abbreviation(&self) -> &str {
        if self.abbreviation.is_empty() {
            &self.name
        } else {
            &self.abbreviation
        }
    }
}

/// A formula saved by the program chairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedFormula {
    pub id: u32,
    pub name: String,
    pub expression: String,
    pub heading_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConferenceSettings {
    pub name: String,
    pub topics: Vec<Topic>,
    /// Submissions list collaborators.
    pub collaborators_enabled: bool,
    /// PC members may see tags on conflicted submissions.
    pub tag_seeall: bool,
    pub blind_submission: bool,
    pub author_view_reviews: bool,
    pub author_view_decision: bool,
    pub reviewer_view_decision: bool,
    pub has_any_accepts: bool,
    pub decisions: Vec<Decision>,
    pub review_fields: Vec<ReviewField>,
    pub formulas: Vec<SavedFormula>,
    /// Vote, approval, and rank tags that get a per-PC report column.
    pub tag_reports: Vec<String>,
    pub pc_members: Vec<Contact>,
}

impl Default for ConferenceSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            topics: Vec::new(),
            collaborators_enabled: false,
            tag_seeall: false,
            blind_submission: true,
            author_view_reviews: false,
            author_view_decision: false,
            reviewer_view_decision: false,
            has_any_accepts: false,
            decisions: Vec::new(),
            review_fields: Vec::new(),
            formulas: Vec::new(),
            tag_reports: Vec::new(),
            pc_members: Vec::new(),
        }
    }
}

impl ConferenceSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn has_topics(&self) -> bool {
        !self.topics.is_empty()
    }

    pub fn topic_name(&self, id: u32) -> Option<&str> {
        self.topics
            .iter()
            .find(|topic| topic.id == id)
            .map(|topic| topic.name.as_str())
    }

    /// Finds a review field by id, abbreviation, or name (case-insensitive).
    pub fn review_field(&self, name: &str) -> Option<&ReviewField> {
        self.review_fields.iter().find(|field| {
            field.id.eq_ignore_ascii_case(name)
                || (!field.abbreviation.is_empty() && field.abbreviation.eq_ignore_ascii_case(name))
                || field.name.eq_ignore_ascii_case(name)
        })
    }

    /// Fields with score options that appear on the form, in display order.
    pub fn score_fields(&self) -> Vec<&ReviewField> {
        let mut fields: Vec<&ReviewField> = self
            .review_fields
            .iter()
            .filter(|field| field.has_options() && field.display_order.is_some())
            .collect();
        fields.sort_by_key(|field| field.display_order);
        fields
    }

    pub fn decision_name(&self, outcome: i32) -> String {
        if let Some(decision) = self.decisions.iter().find(|d| d.id == outcome) {
            return decision.name.clone();
        }
        match outcome {
            0 => "Unknown".to_string(),
            o if o > 0 => "Accepted".to_string(),
            _ => "Rejected".to_string(),
        }
    }

    pub fn pc_member(&self, id: ContactId) -> Option<&Contact> {
        self.pc_members
            .iter()
            .find(|member| member.contact_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = r#"
name = "SOSP"
collaborators_enabled = true
author_view_decision = true

[[topics]]
id = 1
name = "Storage"

[[decisions]]
id = 1
name = "Accept (oral)"

[[review_fields]]
id = "overAllMerit"
name = "Overall merit"
abbreviation = "OveMer"
options = ["Reject", "Weak reject", "Weak accept", "Accept"]
display_order = 1

[[review_fields]]
id = "commentsToPC"
name = "Comments to PC"
view_score = -1
display_order = 2

[[formulas]]
id = 3
name = "Merit avg"
expression = "avg(OveMer)"
"#;

    #[test]
    fn parses_toml_with_defaults() {
        let settings = ConferenceSettings::from_toml_str(SETTINGS).expect("parse settings");
        assert!(settings.blind_submission);
        assert!(settings.has_topics());
        assert_eq!(settings.topic_name(1), Some("Storage"));
        assert_eq!(settings.decision_name(1), "Accept (oral)");
        assert_eq!(settings.decision_name(-1), "Rejected");
        assert_eq!(settings.formulas[0].expression, "avg(OveMer)");
    }

    #[test]
    fn review_field_lookup_accepts_any_name() {
        let settings = ConferenceSettings::from_toml_str(SETTINGS).expect("parse settings");
        for name in ["overallmerit", "OVEMER", "Overall Merit"] {
            let field = settings.review_field(name).expect("field");
            assert_eq!(field.id, "overAllMerit");
        }
        assert_eq!(settings.score_fields().len(), 1);
        assert_eq!(
            settings.review_field("commentsToPC").map(|f| f.view_score),
            Some(ViewScore::REVIEWER_ONLY)
        );
    }
}
