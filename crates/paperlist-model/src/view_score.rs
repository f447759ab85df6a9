//! Visibility levels for review fields and computed values.
//!
//! Every review field carries a view score describing the least privileged
//! audience allowed to see it. Viewers carry a *bound*: a value is visible to
//! a viewer exactly when its view score is strictly greater than the bound.

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ViewScore(pub i32);

impl ViewScore {
    /// Never visible.
    pub const FALSE: ViewScore = ViewScore(-3);
    /// Visible to administrators only.
    pub const ADMIN_ONLY: ViewScore = ViewScore(-2);
    /// Visible to reviewers who have completed a review.
    pub const REVIEWER_ONLY: ViewScore = ViewScore(-1);
    /// Visible to program committee members.
    pub const PC: ViewScore = ViewScore(0);
    /// Visible to authors once reviews are released.
    pub const AUTHOR: ViewScore = ViewScore(1);

    /// Bound for a viewer that may see everything up to `score`.
    pub const fn bound_below(score: ViewScore) -> ViewScore {
        ViewScore(score.0 - 1)
    }

    pub fn visible_above(self, bound: ViewScore) -> bool {
        self > bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_admits_only_higher_scores() {
        let reviewer_bound = ViewScore::bound_below(ViewScore::REVIEWER_ONLY);
        assert!(ViewScore::PC.visible_above(reviewer_bound));
        assert!(ViewScore::REVIEWER_ONLY.visible_above(reviewer_bound));
        assert!(!ViewScore::ADMIN_ONLY.visible_above(reviewer_bound));
    }
}
