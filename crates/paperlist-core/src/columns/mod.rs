//! Concrete listing columns.
//!
//! Each submodule groups columns that read the same part of a submission.
//! Columns that take no parameters also implement [`Default`].

mod authors;
mod basic;
mod common;
mod formula;
mod preference;
mod reviewer;
mod score;
mod status;
mod tags;

pub use authors::{AuthorsColumn, CollaboratorsColumn, ConflictMatchColumn, MatchField};
pub use basic::{
    AbstractColumn, FoldAllColumn, IdColumn, NumericOrderColumn, SelectorColumn, SelectorMode,
    TimestampColumn, TitleColumn,
};
pub use formula::{FormulaColumn, make_formula_column};
pub use preference::{
    DesirabilityColumn, PreferenceColumn, PreferenceListColumn, TopicListColumn, TopicScoreColumn,
};
pub use reviewer::{
    AssignReviewColumn, PcConflictsColumn, PcRole, PcRoleColumn, ReviewDelegationColumn,
    ReviewerListColumn, ReviewerTypeColumn,
};
pub use score::{ScoreColumn, make_score_column};
pub use status::{ReviewStatusColumn, ReviewSubmittedColumn, StatusColumn};
pub use tags::{TagColumn, TagListColumn, TagReportColumn, make_tag_column};

macro_rules! default_from_new {
    ($($column:ty),+ $(,)?) => {
        $(
            impl Default for $column {
                fn default() -> Self {
                    Self::new()
                }
            }
        )+
    };
}

default_from_new!(
    AbstractColumn,
    AssignReviewColumn,
    AuthorsColumn,
    CollaboratorsColumn,
    DesirabilityColumn,
    FoldAllColumn,
    IdColumn,
    NumericOrderColumn,
    PcConflictsColumn,
    ReviewDelegationColumn,
    ReviewStatusColumn,
    ReviewSubmittedColumn,
    ReviewerListColumn,
    ReviewerTypeColumn,
    TagListColumn,
    TimestampColumn,
    TitleColumn,
    TopicListColumn,
    TopicScoreColumn,
);
