//! Submission status and review progress.

use paperlist_model::PaperRow;

use super::common::{ReviewProgress, escape};
use crate::column::{ColumnFlags, ColumnKind, ColumnMeta, ColumnState, PaperColumn, PrepareLevel};
use crate::context::ListContext;
use crate::sort::{SortKey, Sorter};

/// Outcome used for sorting when the decision is hidden from the viewer.
const HIDDEN_OUTCOME: i64 = -10000;

/// Status class and label of a submission as the viewer may see it.
pub(crate) fn status_info(ctx: &ListContext, row: &PaperRow, force: bool) -> (&'static str, String) {
    if row.is_withdrawn() {
        ("pstat_with", "Withdrawn".to_string())
    } else if row.outcome != 0 && ctx.oracle.can_view_decision(&ctx.viewer, row, force) {
        let class = if row.outcome > 0 { "pstat_decyes" } else { "pstat_decno" };
        (class, ctx.settings.decision_name(row.outcome))
    } else if row.is_submitted() {
        ("pstat_sub", "Submitted".to_string())
    } else if row.paper_storage_id <= 1 {
        ("pstat_noup", "No submission".to_string())
    } else {
        ("pstat_prog", "Not ready".to_string())
    }
}

pub struct StatusColumn {
    meta: ColumnMeta,
    full: bool,
}

impl StatusColumn {
    pub fn new(name: &str, full: bool) -> Self {
        Self {
            meta: ColumnMeta::new(name, ColumnFlags::VIEW_COLUMN | ColumnFlags::COMPLETABLE)
                .with_css("pl_status")
                .with_sorter("status"),
            full,
        }
    }

    fn force(ctx: &ListContext, row: &PaperRow) -> bool {
        !ctx.search.is_author_limit() && ctx.oracle.allow_administer(&ctx.viewer, row)
    }
}

impl PaperColumn for StatusColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Status
    }

    fn sort_prepare(
        &self,
        ctx: &ListContext,
        _state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        let force = !ctx.search.is_author_limit() && ctx.viewer.is_chair();
        rows.iter()
            .map(|row| {
                let outcome = if ctx.oracle.can_view_decision(&ctx.viewer, row, force) {
                    i64::from(row.outcome)
                } else {
                    HIDDEN_OUTCOME
                };
                SortKey::List(vec![
                    SortKey::Int(-outcome),
                    SortKey::Int(i64::from(row.is_withdrawn())),
                    SortKey::Int(-i64::from(row.is_submitted())),
                    SortKey::Int(-i64::from(row.paper_storage_id > 1)),
                ])
            })
            .collect()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Status".to_string()
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        if !row.is_submitted() && !row.is_withdrawn() {
            ctx.any.need_submit = true;
        }
        if row.outcome > 0 && ctx.oracle.can_view_decision(&ctx.viewer, row, false) {
            ctx.any.accepted = true;
            if row.time_final_submitted <= 0 {
                ctx.any.need_final = true;
            }
        }
        let (class, label) = status_info(ctx, row, Self::force(ctx, row));
        if !self.full && class == "pstat_sub" {
            return String::new();
        }
        format!("<span class=\"pstat {class}\">{}</span>", escape(&label))
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        status_info(ctx, row, Self::force(ctx, row)).1
    }
}

/// Submitted and started review counts.
pub struct ReviewStatusColumn {
    meta: ColumnMeta,
}

impl ReviewStatusColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new("revstat", ColumnFlags::VIEW_COLUMN | ColumnFlags::COMPLETABLE)
                .with_css("pl_revstat")
                .with_sorter("revstat"),
        }
    }
}

impl PaperColumn for ReviewStatusColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::ReviewStatus
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        let allowed = ctx.oracle.is_reviewer(&ctx.viewer)
            || ctx.settings.author_view_reviews
            || ctx.viewer.is_chair();
        if allowed && level.needs_data() {
            ctx.qopts.set_flag("startedReviewCount");
        }
        allowed
    }

    /// Rows whose reviews the viewer cannot count sort first.
    fn sort_prepare(
        &self,
        ctx: &ListContext,
        _state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        rows.iter()
            .map(|row| {
                let progress = if ctx.oracle.can_count_review(&ctx.viewer, row) {
                    row.num_reviews_submitted() as f64 + row.num_reviews_started() as f64 / 1000.0
                } else {
                    f64::from(i32::MAX)
                };
                SortKey::Float(-progress)
            })
            .collect()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "<span class=\"need-tooltip\" data-tooltip=\"# completed reviews / # assigned reviews\">#&nbsp;Reviews</span>".to_string()
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        !ctx.oracle.can_count_review(&ctx.viewer, row)
    }

    fn content(
        &self,
        _ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let done = row.num_reviews_submitted();
        let started = row.num_reviews_started();
        if done == started {
            format!("<b>{done}</b>")
        } else {
            format!("<b>{done}</b>/{started}")
        }
    }

    fn text(&self, _ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        let done = row.num_reviews_submitted();
        let started = row.num_reviews_started();
        if done == started {
            done.to_string()
        } else {
            format!("{done}/{started}")
        }
    }
}

/// Progress of the reviewer of interest's own review.
pub struct ReviewSubmittedColumn {
    meta: ColumnMeta,
}

impl ReviewSubmittedColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new("revsubmitted", ColumnFlags::VIEW_COLUMN | ColumnFlags::COMPLETABLE)
                .with_css("pl_text"),
        }
    }
}

impl PaperColumn for ReviewSubmittedColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::ReviewSubmitted
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx.viewer.is_pc() {
            return false;
        }
        if level.needs_data() {
            let reviewer = i64::from(ctx.reviewer_cid().0);
            ctx.qopts.set_number("reviewer", reviewer);
        }
        true
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Review status".to_string()
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        row.review_by(ctx.reviewer_cid()).is_none()
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let Some(review) = row.review_by(ctx.reviewer_cid()) else {
            return String::new();
        };
        let progress = ReviewProgress::of(review);
        if progress.needs_submit {
            ctx.any.need_review = true;
        }
        if progress.needs_submit && !progress.delegated {
            format!("<strong class=\"overdue\">{}</strong>", progress.completion)
        } else if !progress.needs_submit {
            format!(
                "<a href=\"review/{}\">{}</a>",
                review.review_id, progress.completion
            )
        } else {
            progress.completion.to_string()
        }
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        row.review_by(ctx.reviewer_cid())
            .map(|review| ReviewProgress::of(review).completion.to_string())
            .unwrap_or_default()
    }
}
