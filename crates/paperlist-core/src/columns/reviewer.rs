//! Review assignments, reviewers and PC roles.

use std::collections::{BTreeMap, HashMap};

use paperlist_model::{
    CONFLICT_AUTHOR, Contact, ContactId, PaperId, PaperRow, REVIEW_PC, REVIEW_PRIMARY, REVIEW_SECONDARY,
    ReviewRow,
};
use tracing::debug;

use super::common::{
    ReviewProgress, contact_name_html, escape, preference_span, printable_time,
    review_type_icon, review_type_label, wrap_conflict,
};
use crate::column::{ColumnFlags, ColumnKind, ColumnMeta, ColumnState, PaperColumn, PrepareLevel};
use crate::context::ListContext;
use crate::sort::{SortKey, Sorter};
use crate::store::{RecordStore, StoreError};

/// A reviewer's relation to one row.
#[derive(Debug, Clone, Copy, Default)]
struct Assignment<'a> {
    review: Option<&'a ReviewRow>,
    conflict_type: i32,
}

impl Assignment<'_> {
    fn review_type(&self) -> i32 {
        self.review.map_or(0, |review| review.review_type)
    }

    fn submitted(&self) -> bool {
        self.review.is_some_and(|review| review.submitted)
    }
}

fn own_assignment<'a>(ctx: &ListContext, row: &'a PaperRow) -> Assignment<'a> {
    let reviewer = ctx.reviewer_cid();
    Assignment {
        review: row.review_by(reviewer),
        conflict_type: row.conflict_type(reviewer),
    }
}

/// Sort weight of an assignment: higher review types first, incomplete
/// reviews just above complete ones of the same type, conflicts last.
fn own_assignment_key(ctx: &ListContext, row: &PaperRow) -> SortKey {
    let assignment = own_assignment(ctx, row);
    let mut weight = 2 * i64::from(assignment.review_type());
    if weight == 0 && assignment.conflict_type > 0 {
        weight = -i64::from(assignment.conflict_type);
    } else if weight > 0 && !assignment.submitted() {
        weight += 1;
    }
    SortKey::Int(-weight)
}

/// The reviewer of interest's assignment type on each row.
pub struct ReviewerTypeColumn {
    meta: ColumnMeta,
}

impl ReviewerTypeColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new("revtype", ColumnFlags::VIEW_COLUMN | ColumnFlags::COMPLETABLE)
                .with_css("pl_revtype")
                .with_sorter("revtype"),
        }
    }

    fn assignment<'a>(ctx: &ListContext, state: &'a ColumnState, row: &'a PaperRow) -> Assignment<'a> {
        match state {
            ColumnState::ReviewerType {
                xreviewer: Some(_),
                rows,
            } => rows
                .get(&row.paper_id)
                .map(|xrow| Assignment {
                    review: xrow.review.as_ref(),
                    conflict_type: xrow.conflict_type,
                })
                .unwrap_or_default(),
            _ => own_assignment(ctx, row),
        }
    }

    fn has_xreviewer(state: &ColumnState) -> bool {
        matches!(
            state,
            ColumnState::ReviewerType {
                xreviewer: Some(_),
                ..
            }
        )
    }
}

impl PaperColumn for ReviewerTypeColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::ReviewerType
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        if level.needs_data() {
            let reviewer = i64::from(ctx.reviewer_cid().0);
            ctx.qopts.set_number("reviewer", reviewer);
        }
        true
    }

    /// Fetches the reviewer of interest's assignments in one batch when the
    /// listing is about someone other than the viewer.
    fn analyze(
        &self,
        ctx: &ListContext,
        state: &mut ColumnState,
        rows: &[PaperRow],
        store: &dyn RecordStore,
    ) -> Result<(), StoreError> {
        let xreviewer = ctx
            .search
            .reviewer
            .as_ref()
            .filter(|reviewer| reviewer.contact_id != ctx.viewer.contact_id);
        let mut annotations = BTreeMap::new();
        if let Some(reviewer) = xreviewer
            && !rows.is_empty()
        {
            let by_id: HashMap<PaperId, &PaperRow> =
                rows.iter().map(|row| (row.paper_id, row)).collect();
            let ids: Vec<PaperId> = rows.iter().map(|row| row.paper_id).collect();
            for xrow in store.fetch_reviewer_rows(reviewer.contact_id, &ids)? {
                let Some(&prow) = by_id.get(&xrow.paper_id) else {
                    continue;
                };
                let visible = ctx.oracle.allow_administer(&ctx.viewer, prow)
                    || ctx.oracle.can_view_review_identity(
                        &ctx.viewer,
                        Some(prow),
                        xrow.review.as_ref(),
                        true,
                    )
                    || (ctx.viewer.is_chair() && xrow.conflict_type > 0 && xrow.review.is_none());
                if visible {
                    annotations.insert(xrow.paper_id, xrow);
                }
            }
            debug!(
                reviewer = %reviewer.contact_id,
                rows = annotations.len(),
                "annotated rows with reviewer assignments"
            );
        }
        *state = ColumnState::ReviewerType {
            xreviewer: xreviewer.cloned(),
            rows: annotations,
        };
        Ok(())
    }

    fn sort_prepare(
        &self,
        ctx: &ListContext,
        state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        let ColumnState::ReviewerType {
            xreviewer: Some(_),
            rows: annotations,
        } = state
        else {
            return rows.iter().map(|row| own_assignment_key(ctx, row)).collect();
        };
        rows.iter()
            .map(|row| {
                let weight = annotations.get(&row.paper_id).map_or(0, |xrow| {
                    let review_type = xrow.review.as_ref().map_or(0, |r| r.review_type);
                    let submitted = xrow.review.as_ref().is_some_and(|r| r.submitted);
                    2 * i64::from(review_type) + i64::from(!submitted)
                });
                SortKey::Int(-weight)
            })
            .collect()
    }

    fn header(&self, _ctx: &ListContext, state: &ColumnState) -> String {
        match state {
            ColumnState::ReviewerType {
                xreviewer: Some(reviewer),
                ..
            } => format!("{}<br />Review", contact_name_html(reviewer)),
            _ => "Review".to_string(),
        }
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let assignment = Self::assignment(ctx, state, row);
        let mut parts = Vec::new();
        if let Some(review) = assignment.review.filter(|review| review.review_type > 0) {
            let progress = ReviewProgress::of(review);
            if progress.needs_submit {
                ctx.any.need_review = true;
            }
            let icon = review_type_icon(review.review_type, review.submitted);
            match &review.round {
                Some(round) => parts.push(format!(
                    "{icon}&nbsp;<span class=\"revround\">{}</span>",
                    escape(round)
                )),
                None => parts.push(icon),
            }
        } else if assignment.conflict_type > 0 {
            parts.push(review_type_icon(-1, false));
        }
        if !Self::has_xreviewer(state) {
            let viewer = ctx.viewer.contact_id;
            if row.lead_contact_id == Some(viewer) {
                parts.push("<span class=\"rtlead\" title=\"Lead\"><span class=\"rti\">L</span></span>".to_string());
            }
            if row.shepherd_contact_id == Some(viewer) {
                parts.push("<span class=\"rtshep\" title=\"Shepherd\"><span class=\"rti\">S</span></span>".to_string());
            }
        }
        parts.join(" ")
    }

    fn text(&self, ctx: &ListContext, state: &ColumnState, row: &PaperRow) -> String {
        let assignment = Self::assignment(ctx, state, row);
        let review_type = if assignment.review_type() > 0 {
            assignment.review_type()
        } else if assignment.conflict_type > 0 {
            -1
        } else {
            0
        };
        review_type_label(review_type)
            .map(|(label, _)| label.to_string())
            .unwrap_or_default()
    }
}

const ASSIGNMENT_CHOICES: [(i32, &str); 5] = [
    (0, "None"),
    (REVIEW_PRIMARY, "Primary"),
    (REVIEW_SECONDARY, "Secondary"),
    (REVIEW_PC, "Optional"),
    (-1, "Conflict"),
];

/// Assignment selector for managers.
pub struct AssignReviewColumn {
    meta: ColumnMeta,
}

impl AssignReviewColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new("assrev", ColumnFlags::VIEW_COLUMN)
                .with_css("pl_assrev")
                .with_sorter("revtype"),
        }
    }

    fn current(ctx: &ListContext, row: &PaperRow) -> Option<i32> {
        let reviewer = ctx.reviewer_cid();
        let conflict = row.conflict_type(reviewer);
        if conflict >= CONFLICT_AUTHOR {
            None
        } else if conflict > 0 {
            Some(-1)
        } else {
            Some(row.review_type(reviewer).clamp(0, REVIEW_PRIMARY))
        }
    }
}

impl PaperColumn for AssignReviewColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::AssignReview
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx.viewer.is_manager() {
            return false;
        }
        if level.is_displayed() {
            ctx.add_footer_script("add_assrev_ajax()");
        }
        let reviewer = i64::from(ctx.reviewer_cid().0);
        ctx.qopts.set_number("reviewer", reviewer);
        true
    }

    fn sort_prepare(
        &self,
        ctx: &ListContext,
        _state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        rows.iter().map(|row| own_assignment_key(ctx, row)).collect()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Assignment".to_string()
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        !ctx.oracle.allow_administer(&ctx.viewer, row)
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let Some(current) = Self::current(ctx, row) else {
            return "<span class=\"author\">Author</span>".to_string();
        };
        let full = current > 0
            || ctx
                .oracle
                .can_accept_review_assignment(ctx.reviewer_contact(), row);
        let options: String = ASSIGNMENT_CHOICES
            .iter()
            .filter(|(value, _)| full || *value <= 0)
            .map(|(value, label)| {
                let selected = if *value == current { " selected" } else { "" };
                format!("<option value=\"{value}\"{selected}>{label}</option>")
            })
            .collect();
        format!(
            "<select name=\"assrev{}u{}\" class=\"uich js-assign-review\" tabindex=\"3\">{options}</select>",
            row.paper_id,
            ctx.reviewer_cid()
        )
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        match Self::current(ctx, row) {
            None => "Author".to_string(),
            Some(current) => ASSIGNMENT_CHOICES
                .iter()
                .find(|(value, _)| *value == current)
                .map(|(_, label)| (*label).to_string())
                .unwrap_or_default(),
        }
    }
}

/// Reviews the reviewer of interest delegated to someone else.
pub struct ReviewDelegationColumn {
    meta: ColumnMeta,
}

impl ReviewDelegationColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new("revdelegation", ColumnFlags::VIEW_COLUMN)
                .with_css("pl_text")
                .with_sorter("revdelegation"),
        }
    }

    fn delegated(requester: ContactId, row: &PaperRow) -> Option<&ReviewRow> {
        row.reviews
            .iter()
            .find(|review| review.requested_by == Some(requester) && review.contact_id != requester)
    }
}

impl PaperColumn for ReviewDelegationColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::ReviewDelegation
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx.viewer.is_pc() {
            return false;
        }
        if level.needs_data() {
            let requester = i64::from(ctx.reviewer_cid().0);
            ctx.qopts.set_flag("reviewerName");
            ctx.qopts.set_flag("allReviewScores");
            ctx.qopts.set_number("reviewRequestedBy", requester);
        }
        true
    }

    fn sort_prepare(
        &self,
        ctx: &ListContext,
        _state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        let requester = ctx.reviewer_cid();
        rows.iter()
            .map(|row| match Self::delegated(requester, row) {
                Some(review) => SortKey::List(vec![
                    SortKey::Text(review.reviewer_last_name.to_lowercase()),
                    SortKey::Text(review.reviewer_first_name.to_lowercase()),
                    SortKey::Text(review.reviewer_email.to_lowercase()),
                ]),
                None => SortKey::Null,
            })
            .collect()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Reviewer".to_string()
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        Self::delegated(ctx.reviewer_cid(), row).is_none()
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let Some(review) = Self::delegated(ctx.reviewer_cid(), row) else {
            return String::new();
        };
        let login = if review.reviewer_last_login > 0 {
            printable_time(review.reviewer_last_login)
        } else {
            "Never".to_string()
        };
        format!(
            "{}<br /><small class=\"dim\">Last login: {}</small>",
            escape(&review.reviewer_name()),
            escape(&login)
        )
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        Self::delegated(ctx.reviewer_cid(), row)
            .map(ReviewRow::reviewer_name)
            .unwrap_or_default()
    }
}

/// Everyone reviewing a submission.
pub struct ReviewerListColumn {
    meta: ColumnMeta,
}

impl ReviewerListColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new(
                "reviewers",
                ColumnFlags::VIEW_ROW | ColumnFlags::FOLDABLE | ColumnFlags::COMPLETABLE,
            )
            .with_css("pl_reviewers"),
        }
    }

    fn visible<'a>(ctx: &ListContext, row: &'a PaperRow) -> Vec<&'a ReviewRow> {
        row.reviews
            .iter()
            .filter(|review| {
                !review.reviewer_name().is_empty()
                    && ctx
                        .oracle
                        .can_view_review_identity(&ctx.viewer, Some(row), Some(review), true)
            })
            .collect()
    }
}

impl PaperColumn for ReviewerListColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::ReviewerList
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx
            .oracle
            .can_view_review_identity(&ctx.viewer, None, None, false)
        {
            return false;
        }
        if level.needs_data() {
            ctx.qopts.set_flag("reviewList");
            if ctx.viewer.is_chair() {
                ctx.qopts.set_flag("allReviewerPreference");
                ctx.qopts.set_flag("topics");
            }
        }
        true
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Reviewers".to_string()
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        Self::visible(ctx, row).is_empty()
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let chair = ctx.viewer.is_chair();
        let names: Vec<String> = Self::visible(ctx, row)
            .into_iter()
            .map(|review| {
                let mut html = escape(&review.reviewer_name());
                if review.review_type >= REVIEW_SECONDARY {
                    html.push_str("&nbsp;");
                    html.push_str(&review_type_icon(review.review_type, review.submitted));
                }
                if chair {
                    let topic_score = ctx
                        .settings
                        .pc_member(review.contact_id)
                        .map(|member| row.topic_interest_score(member));
                    html.push_str(&preference_span(
                        row.preference(review.contact_id),
                        topic_score,
                    ));
                }
                html
            })
            .collect();
        let html = names.join(", ");
        if ctx
            .oracle
            .can_view_review_identity(&ctx.viewer, Some(row), None, false)
        {
            html
        } else {
            wrap_conflict(&html)
        }
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        Self::visible(ctx, row)
            .into_iter()
            .map(ReviewRow::reviewer_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcRole {
    Lead,
    Shepherd,
}

/// The discussion lead or shepherd of a submission.
pub struct PcRoleColumn {
    meta: ColumnMeta,
    role: PcRole,
}

impl PcRoleColumn {
    pub fn new(role: PcRole) -> Self {
        let name = match role {
            PcRole::Lead => "lead",
            PcRole::Shepherd => "shepherd",
        };
        Self {
            meta: ColumnMeta::new(
                name,
                ColumnFlags::VIEW_ROW | ColumnFlags::FOLDABLE | ColumnFlags::COMPLETABLE,
            )
            .with_css("pl_text"),
            role,
        }
    }

    fn contact(&self, row: &PaperRow) -> Option<ContactId> {
        match self.role {
            PcRole::Lead => row.lead_contact_id,
            PcRole::Shepherd => row.shepherd_contact_id,
        }
    }

    fn can_view(&self, ctx: &ListContext, row: Option<&PaperRow>, force: bool) -> bool {
        match self.role {
            PcRole::Lead => ctx.oracle.can_view_lead(&ctx.viewer, row, force),
            PcRole::Shepherd => ctx.oracle.can_view_shepherd(&ctx.viewer, row, force),
        }
    }

    fn contact_name(ctx: &ListContext, id: ContactId) -> String {
        ctx.settings
            .pc_member(id)
            .map_or_else(|| format!("#{id}"), Contact::display_name)
    }
}

impl PaperColumn for PcRoleColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        match self.role {
            PcRole::Lead => ColumnKind::Lead,
            PcRole::Shepherd => ColumnKind::Shepherd,
        }
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, _level: PrepareLevel) -> bool {
        match self.role {
            PcRole::Lead => self.can_view(ctx, None, true),
            PcRole::Shepherd => {
                ctx.viewer.is_pc()
                    || (ctx.settings.has_any_accepts && ctx.settings.author_view_decision)
            }
        }
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        match self.role {
            PcRole::Lead => "Discussion lead".to_string(),
            PcRole::Shepherd => "Shepherd".to_string(),
        }
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        self.contact(row).is_none() || !self.can_view(ctx, Some(row), true)
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let Some(id) = self.contact(row) else {
            return String::new();
        };
        let html = escape(&Self::contact_name(ctx, id));
        if self.can_view(ctx, Some(row), false) {
            html
        } else {
            wrap_conflict(&html)
        }
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        self.contact(row)
            .map(|id| Self::contact_name(ctx, id))
            .unwrap_or_default()
    }
}

/// PC members conflicted with each submission; chairs only.
pub struct PcConflictsColumn {
    meta: ColumnMeta,
}

impl PcConflictsColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new(
                "pcconf",
                ColumnFlags::VIEW_ROW | ColumnFlags::FOLDABLE | ColumnFlags::COMPLETABLE,
            )
            .with_css("pl_pcconf"),
        }
    }

    fn conflicted(ctx: &ListContext, row: &PaperRow) -> Vec<String> {
        ctx.settings
            .pc_members
            .iter()
            .filter(|member| row.conflict_type(member.contact_id) > 0)
            .map(Contact::display_name)
            .collect()
    }
}

impl PaperColumn for PcConflictsColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::PcConflicts
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx.viewer.is_chair() {
            return false;
        }
        if level.needs_data() {
            ctx.qopts.set_flag("allConflictType");
        }
        true
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "PC conflicts".to_string()
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        Self::conflicted(ctx, row).is_empty()
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        Self::conflicted(ctx, row)
            .iter()
            .map(|name| escape(name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        Self::conflicted(ctx, row).join(", ")
    }
}
