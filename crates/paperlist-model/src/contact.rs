use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::ContactId;

/// Role bits for a user account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Roles {
    /// Program committee member.
    pub pc: bool,
    /// Program chair; implies PC membership and full administration.
    pub chair: bool,
    /// Track manager without chair privileges.
    pub manager: bool,
    /// External reviewer with at least one assignment.
    pub reviewer: bool,
}

/// A user viewing the listing, or a reviewer the listing is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub contact_id: ContactId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Roles,
    /// Interest per topic id, typically in -2..=2.
    pub topic_interest: BTreeMap<u32, i32>,
}

impl Contact {
    pub fn new(contact_id: u32, first_name: &str, last_name: &str) -> Self {
        Self {
            contact_id: ContactId(contact_id),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_roles(mut self, roles: Roles) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    pub fn is_chair(&self) -> bool {
        self.roles.chair
    }

    pub fn is_pc(&self) -> bool {
        self.roles.pc || self.roles.chair
    }

    pub fn is_manager(&self) -> bool {
        self.roles.chair || self.roles.manager
    }

    /// Display name: "First Last", falling back to the email address.
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chair_implies_pc_and_manager() {
        let chair = Contact::new(1, "Ada", "Chair").with_roles(Roles {
            chair: true,
            ..Roles::default()
        });
        assert!(chair.is_pc());
        assert!(chair.is_manager());
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let nameless = Contact::new(7, "", "").with_email("anon@example.org");
        assert_eq!(nameless.display_name(), "anon@example.org");
    }
}
