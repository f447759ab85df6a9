//! The capability oracle answers every "may this viewer see X" question.
//!
//! The listing never decides visibility on its own. Columns and formulas call
//! into a [`CapabilityOracle`] and trust the answer. [`RolePolicy`] is a
//! role-based implementation driven by [`ConferenceSettings`].

use std::sync::Arc;

use crate::contact::Contact;
use crate::paper::{PaperRow, ReviewRow};
use crate::settings::ConferenceSettings;
use crate::view_score::ViewScore;

/// Visibility decisions for one viewer.
///
/// `force` asks whether the viewer could see the value by overriding a
/// conflict, the way an administrator may.
pub trait CapabilityOracle: Send + Sync {
    fn allow_administer(&self, viewer: &Contact, paper: &PaperRow) -> bool;

    fn can_view_decision(&self, viewer: &Contact, paper: &PaperRow, force: bool) -> bool;

    /// With `paper == None`, whether the viewer can see tags on any submission.
    fn can_view_tags(&self, viewer: &Contact, paper: Option<&PaperRow>, force: bool) -> bool;

    fn can_view_authors(&self, viewer: &Contact, paper: &PaperRow, force: bool) -> bool;

    fn can_count_review(&self, viewer: &Contact, paper: &PaperRow) -> bool;

    fn can_view_review(
        &self,
        viewer: &Contact,
        paper: &PaperRow,
        review: &ReviewRow,
        force: bool,
    ) -> bool;

    /// With `paper == None`, whether the viewer can see some reviewer identity.
    fn can_view_review_identity(
        &self,
        viewer: &Contact,
        paper: Option<&PaperRow>,
        review: Option<&ReviewRow>,
        force: bool,
    ) -> bool;

    fn can_view_lead(&self, viewer: &Contact, paper: Option<&PaperRow>, force: bool) -> bool;

    fn can_view_shepherd(&self, viewer: &Contact, paper: Option<&PaperRow>, force: bool) -> bool;

    /// Whether `reviewer` could take a review assignment, conflicts aside.
    fn can_accept_review_assignment(&self, reviewer: &Contact, paper: &PaperRow) -> bool;

    fn is_reviewer(&self, viewer: &Contact) -> bool;

    /// The most permissive bound the viewer has on any submission.
    fn permissive_view_score_bound(&self, viewer: &Contact) -> ViewScore;

    /// The viewer's bound on one submission.
    fn view_score_bound(&self, viewer: &Contact, paper: &PaperRow, force: bool) -> ViewScore;
}

/// Role-based oracle.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    settings: Arc<ConferenceSettings>,
}

impl RolePolicy {
    pub fn new(settings: Arc<ConferenceSettings>) -> Self {
        Self { settings }
    }

    fn conflicted(viewer: &Contact, paper: &PaperRow) -> bool {
        paper.conflict_type(viewer.contact_id) > 0
    }

    /// Administrator rights that hold without overriding a conflict.
    fn administers(&self, viewer: &Contact, paper: &PaperRow, force: bool) -> bool {
        self.allow_administer(viewer, paper) && (force || !Self::conflicted(viewer, paper))
    }

    fn unconflicted_pc(viewer: &Contact, paper: &PaperRow) -> bool {
        viewer.is_pc() && !Self::conflicted(viewer, paper)
    }
}

impl CapabilityOracle for RolePolicy {
    fn allow_administer(&self, viewer: &Contact, paper: &PaperRow) -> bool {
        viewer.is_chair() || (viewer.is_manager() && !paper.is_author(viewer.contact_id))
    }

    fn can_view_decision(&self, viewer: &Contact, paper: &PaperRow, force: bool) -> bool {
        if self.administers(viewer, paper, force) {
            return true;
        }
        if paper.is_author(viewer.contact_id) {
            return self.settings.author_view_decision;
        }
        let reviews_it = Self::unconflicted_pc(viewer, paper)
            || paper.review_by(viewer.contact_id).is_some();
        reviews_it && (self.settings.reviewer_view_decision || self.settings.author_view_decision)
    }

    fn can_view_tags(&self, viewer: &Contact, paper: Option<&PaperRow>, force: bool) -> bool {
        let Some(paper) = paper else {
            return viewer.is_pc();
        };
        viewer.is_pc()
            && (!Self::conflicted(viewer, paper)
                || self.settings.tag_seeall
                || self.administers(viewer, paper, force))
    }

    fn can_view_authors(&self, viewer: &Contact, paper: &PaperRow, force: bool) -> bool {
        if paper.is_author(viewer.contact_id) || (force && self.allow_administer(viewer, paper)) {
            return true;
        }
        let reviews_it = viewer.is_pc() || paper.review_by(viewer.contact_id).is_some();
        reviews_it
            && (!self.settings.blind_submission
                || (paper.outcome > 0 && self.can_view_decision(viewer, paper, false)))
    }

    fn can_count_review(&self, viewer: &Contact, paper: &PaperRow) -> bool {
        self.administers(viewer, paper, false)
            || Self::unconflicted_pc(viewer, paper)
            || paper.review_by(viewer.contact_id).is_some()
            || (paper.is_author(viewer.contact_id) && self.settings.author_view_reviews)
    }

    fn can_view_review(
        &self,
        viewer: &Contact,
        paper: &PaperRow,
        review: &ReviewRow,
        force: bool,
    ) -> bool {
        if self.administers(viewer, paper, force) || review.contact_id == viewer.contact_id {
            return true;
        }
        if paper.is_author(viewer.contact_id) {
            return self.settings.author_view_reviews && review.submitted;
        }
        let own_done = paper
            .review_by(viewer.contact_id)
            .is_some_and(|own| own.submitted);
        review.submitted && (Self::unconflicted_pc(viewer, paper) || own_done)
    }

    fn can_view_review_identity(
        &self,
        viewer: &Contact,
        paper: Option<&PaperRow>,
        review: Option<&ReviewRow>,
        force: bool,
    ) -> bool {
        let Some(paper) = paper else {
            return viewer.is_pc();
        };
        if self.administers(viewer, paper, force) {
            return true;
        }
        if review.is_some_and(|r| r.contact_id == viewer.contact_id) {
            return true;
        }
        Self::unconflicted_pc(viewer, paper)
    }

    fn can_view_lead(&self, viewer: &Contact, paper: Option<&PaperRow>, force: bool) -> bool {
        match paper {
            None => viewer.is_pc(),
            Some(paper) => {
                self.administers(viewer, paper, force) || Self::unconflicted_pc(viewer, paper)
            }
        }
    }

    fn can_view_shepherd(&self, viewer: &Contact, paper: Option<&PaperRow>, force: bool) -> bool {
        if self.can_view_lead(viewer, paper, force) {
            return true;
        }
        match paper {
            None => self.settings.has_any_accepts && self.settings.author_view_decision,
            Some(paper) => {
                paper.outcome > 0
                    && paper.is_author(viewer.contact_id)
                    && self.settings.author_view_decision
            }
        }
    }

    fn can_accept_review_assignment(&self, reviewer: &Contact, paper: &PaperRow) -> bool {
        reviewer.is_pc() && !paper.is_author(reviewer.contact_id)
    }

    fn is_reviewer(&self, viewer: &Contact) -> bool {
        viewer.is_pc() || viewer.roles.reviewer
    }

    fn permissive_view_score_bound(&self, viewer: &Contact) -> ViewScore {
        if viewer.is_manager() {
            ViewScore::bound_below(ViewScore::ADMIN_ONLY)
        } else if self.is_reviewer(viewer) {
            ViewScore::bound_below(ViewScore::REVIEWER_ONLY)
        } else {
            ViewScore::bound_below(ViewScore::AUTHOR)
        }
    }

    fn view_score_bound(&self, viewer: &Contact, paper: &PaperRow, force: bool) -> ViewScore {
        if self.administers(viewer, paper, force) {
            ViewScore::bound_below(ViewScore::ADMIN_ONLY)
        } else if paper
            .review_by(viewer.contact_id)
            .is_some_and(|own| own.submitted)
        {
            ViewScore::bound_below(ViewScore::REVIEWER_ONLY)
        } else if Self::unconflicted_pc(viewer, paper) {
            ViewScore::bound_below(ViewScore::PC)
        } else if paper.is_author(viewer.contact_id) && self.settings.author_view_reviews {
            ViewScore::bound_below(ViewScore::AUTHOR)
        } else {
            ViewScore::AUTHOR
        }
    }
}
