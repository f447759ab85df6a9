//! Review preferences, topic interest and desirability.

use paperlist_model::{Contact, PaperRow};

use super::common::{escape, escape_attr, preference_span, unparse_preference};
use crate::column::{ColumnFlags, ColumnKind, ColumnMeta, ColumnState, PaperColumn, PrepareLevel};
use crate::context::ListContext;
use crate::sort::{SortKey, Sorter};

/// The reviewer of interest's preference, optionally editable.
pub struct PreferenceColumn {
    meta: ColumnMeta,
    editable: bool,
}

impl PreferenceColumn {
    pub fn new(name: &str, editable: bool) -> Self {
        let css = if editable { "pl_editrevpref" } else { "pl_revpref" };
        Self {
            meta: ColumnMeta::new(name, ColumnFlags::VIEW_COLUMN | ColumnFlags::COMPLETABLE)
                .with_css(css)
                .with_sorter("revpref"),
            editable,
        }
    }

    fn may_view(ctx: &ListContext, row: &PaperRow) -> bool {
        ctx.reviewer_cid() == ctx.viewer.contact_id
            || ctx.oracle.allow_administer(&ctx.viewer, row)
    }
}

impl PaperColumn for PreferenceColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Preference
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx.viewer.is_pc() {
            return false;
        }
        if level.needs_data() {
            let reviewer = i64::from(ctx.reviewer_cid().0);
            ctx.qopts.set_flag("reviewerPreference");
            ctx.qopts.set_flag("topicInterestScore");
            ctx.qopts.set_number("reviewer", reviewer);
        }
        if self.editable && level.is_displayed() {
            let reviewer = ctx.reviewer_cid();
            ctx.add_footer_script(format!("add_revpref_ajax(\".revpref\",{reviewer})"));
        }
        true
    }

    /// Higher preference first, then higher topic interest.
    fn sort_prepare(
        &self,
        ctx: &ListContext,
        _state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        let reviewer = ctx.reviewer_contact();
        rows.iter()
            .map(|row| {
                let preference = row.preference(reviewer.contact_id);
                SortKey::List(vec![
                    SortKey::Int(-i64::from(preference.value)),
                    SortKey::Int(-i64::from(row.topic_interest_score(reviewer))),
                ])
            })
            .collect()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Preference".to_string()
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        if !Self::may_view(ctx, row) {
            return "N/A".to_string();
        }
        let reviewer = ctx.reviewer_cid();
        let preference = row.preference(reviewer);
        let text = if preference.is_empty() {
            String::new()
        } else {
            unparse_preference(preference)
        };
        if !self.editable {
            return escape(&text);
        }
        if row.conflict_type(reviewer) > 0 {
            return "N/A".to_string();
        }
        format!(
            "<input name=\"revpref{}u{reviewer}\" class=\"revpref\" value=\"{}\" type=\"text\" size=\"4\" tabindex=\"2\" placeholder=\"0\" />",
            row.paper_id,
            escape_attr(&text)
        )
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        if !Self::may_view(ctx, row) {
            return String::new();
        }
        unparse_preference(row.preference(ctx.reviewer_cid()))
    }
}

/// Every PC member's preference on a submission; managers only.
pub struct PreferenceListColumn {
    meta: ColumnMeta,
    topics: bool,
}

impl PreferenceListColumn {
    pub fn new(name: &str, topics: bool) -> Self {
        Self {
            meta: ColumnMeta::new(
                name,
                ColumnFlags::VIEW_ROW | ColumnFlags::FOLDABLE | ColumnFlags::COMPLETABLE,
            )
            .with_css("pl_allrevpref"),
            topics,
        }
    }

    fn entries(ctx: &ListContext, state: &ColumnState, row: &PaperRow) -> Vec<(String, String)> {
        let topics = matches!(state, ColumnState::PreferenceList { topics: true });
        ctx.settings
            .pc_members
            .iter()
            .filter_map(|member: &Contact| {
                let topic_score = topics.then(|| row.topic_interest_score(member));
                let span = preference_span(row.preference(member.contact_id), topic_score);
                (!span.is_empty()).then(|| (member.display_name(), span))
            })
            .collect()
    }
}

impl PaperColumn for PreferenceListColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::PreferenceList
    }

    fn prepare(&self, ctx: &mut ListContext, state: &mut ColumnState, level: PrepareLevel) -> bool {
        let topics = self.topics && ctx.settings.has_topics();
        *state = ColumnState::PreferenceList { topics };
        if !ctx.viewer.is_manager() {
            return false;
        }
        if level.needs_data() {
            ctx.qopts.set_flag("allReviewerPreference");
            ctx.qopts.set_flag("allConflictType");
            if topics {
                ctx.qopts.set_flag("topics");
            }
        }
        true
    }

    fn header(&self, _ctx: &ListContext, state: &ColumnState) -> String {
        match state {
            ColumnState::PreferenceList { topics: true } => {
                "Preferences and topic scores".to_string()
            }
            _ => "Preferences".to_string(),
        }
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        !ctx.oracle.allow_administer(&ctx.viewer, row)
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        Self::entries(ctx, state, row)
            .into_iter()
            .map(|(name, span)| format!("<span class=\"nw\">{}{span}</span>", escape(&name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn text(&self, ctx: &ListContext, state: &ColumnState, row: &PaperRow) -> String {
        let topics = matches!(state, ColumnState::PreferenceList { topics: true });
        ctx.settings
            .pc_members
            .iter()
            .filter_map(|member| {
                let preference = row.preference(member.contact_id);
                let topic_score = if topics { row.topic_interest_score(member) } else { 0 };
                if preference.is_empty() && topic_score == 0 {
                    return None;
                }
                let mut entry = member.display_name();
                if !preference.is_empty() {
                    entry.push_str(" P");
                    entry.push_str(&unparse_preference(preference));
                }
                if topic_score != 0 {
                    entry.push_str(&format!(" T{topic_score}"));
                }
                Some(entry)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The reviewer of interest's topic interest in a submission.
pub struct TopicScoreColumn {
    meta: ColumnMeta,
}

impl TopicScoreColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new("topicscore", ColumnFlags::VIEW_COLUMN | ColumnFlags::COMPLETABLE)
                .with_css("pl_topicscore")
                .with_sorter("topicscore"),
        }
    }
}

impl PaperColumn for TopicScoreColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::TopicScore
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx.settings.has_topics() || !ctx.viewer.is_pc() {
            return false;
        }
        if level.needs_data() {
            let reviewer = i64::from(ctx.reviewer_cid().0);
            ctx.qopts.set_number("reviewer", reviewer);
            ctx.qopts.set_flag("topicInterestScore");
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
        let reviewer = ctx.reviewer_contact();
        rows.iter()
            .map(|row| SortKey::Int(-i64::from(row.topic_interest_score(reviewer))))
            .collect()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Topic<br/>score".to_string()
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        row.topic_interest_score(ctx.reviewer_contact()).to_string()
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        row.topic_interest_score(ctx.reviewer_contact()).to_string()
    }
}

/// Topic names of a submission, marked with the viewer's interest.
pub struct TopicListColumn {
    meta: ColumnMeta,
}

impl TopicListColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new(
                "topics",
                ColumnFlags::VIEW_ROW | ColumnFlags::FOLDABLE | ColumnFlags::COMPLETABLE,
            )
            .with_css("pl_topics"),
        }
    }

    fn names(ctx: &ListContext, row: &PaperRow) -> Vec<(String, i32)> {
        row.topic_ids
            .iter()
            .filter_map(|id| {
                let name = ctx.settings.topic_name(*id)?;
                let interest = ctx.viewer.topic_interest.get(id).copied().unwrap_or(0);
                Some((name.to_string(), interest))
            })
            .collect()
    }
}

impl PaperColumn for TopicListColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::TopicList
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx.settings.has_topics() {
            return false;
        }
        if level.needs_data() {
            ctx.qopts.set_flag("topics");
        }
        true
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Topics".to_string()
    }

    fn content_empty(&self, _ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        row.topic_ids.is_empty()
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        Self::names(ctx, row)
            .iter()
            .map(|(name, interest)| {
                let class = match interest.signum() {
                    1 => " topic1",
                    -1 => " topic-1",
                    _ => "",
                };
                format!("<span class=\"topicsp{class}\">{}</span>", escape(name))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        Self::names(ctx, row)
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Aggregate reviewer desirability; chairs only.
pub struct DesirabilityColumn {
    meta: ColumnMeta,
}

impl DesirabilityColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new("desirability", ColumnFlags::VIEW_COLUMN | ColumnFlags::COMPLETABLE)
                .with_css("pl_desirability")
                .with_sorter("desirability"),
        }
    }
}

impl PaperColumn for DesirabilityColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Desirability
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx.viewer.is_chair() {
            return false;
        }
        if level.needs_data() {
            ctx.qopts.set_flag("desirability");
        }
        true
    }

    fn sort_prepare(
        &self,
        _ctx: &ListContext,
        _state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        rows.iter()
            .map(|row| SortKey::Int(-row.desirability))
            .collect()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Desirability".to_string()
    }

    fn content(
        &self,
        _ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        row.desirability.to_string()
    }

    fn text(&self, _ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        row.desirability.to_string()
    }
}
