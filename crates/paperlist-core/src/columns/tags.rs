//! Tag list, single-tag and tag-report columns.

use std::sync::Arc;

use paperlist_model::tags::{canonical_tag, viewable_tags};
use paperlist_model::{PaperRow, TagValue};

use super::common::{contact_name_html, escape, escape_attr, wrap_conflict};
use crate::column::{ColumnFlags, ColumnKind, ColumnMeta, ColumnState, PaperColumn, PrepareLevel};
use crate::context::ListContext;
use crate::error::ColumnErrors;
use crate::registry::FactoryRequest;
use crate::sort::{SortKey, Sorter};

/// Sort value of rows whose tags the viewer may not see.
const UNVIEWABLE_TAG: i64 = 2_147_483_647;
/// Sort value of untagged rows in an editable column, just ahead of unviewable ones.
const EMPTY_EDITABLE_TAG: i64 = 2_147_483_646;

fn tag_link(tag: &TagValue, highlighted: bool) -> String {
    let class = if highlighted { "qq nw hltag" } else { "qq nw" };
    let label = if tag.value == 0 {
        format!("#{}", tag.tag)
    } else {
        format!("#{}#{}", tag.tag, tag.value)
    };
    format!(
        "<a class=\"{class}\" href=\"search?q=%23{}\">{}</a>",
        escape_attr(&tag.tag),
        escape(&label)
    )
}

pub struct TagListColumn {
    meta: ColumnMeta,
}

impl TagListColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new(
                "tags",
                ColumnFlags::VIEW_ROW | ColumnFlags::FOLDABLE | ColumnFlags::COMPLETABLE,
            )
            .with_css("pl_tags"),
        }
    }

    fn visible(ctx: &ListContext, row: &PaperRow) -> Vec<TagValue> {
        viewable_tags(&row.paper_tags, ctx.viewer.contact_id, ctx.viewer.is_chair())
    }
}

impl PaperColumn for TagListColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::TagList
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx.oracle.can_view_tags(&ctx.viewer, None, false) {
            return false;
        }
        if level.needs_data() {
            ctx.qopts.set_flag("tags");
        }
        true
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Tags".to_string()
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        !ctx.oracle.can_view_tags(&ctx.viewer, Some(row), true)
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let html = Self::visible(ctx, row)
            .iter()
            .map(|tag| {
                let highlighted = ctx
                    .search
                    .highlight_tags
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(&tag.tag));
                tag_link(tag, highlighted)
            })
            .collect::<Vec<_>>()
            .join(" ");
        let unconflicted = row.conflict_type(ctx.viewer.contact_id) <= 0;
        if html.is_empty()
            || unconflicted
            || ctx.oracle.can_view_tags(&ctx.viewer, Some(row), false)
        {
            html
        } else {
            wrap_conflict(&html)
        }
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        Self::visible(ctx, row)
            .iter()
            .map(|tag| {
                if tag.value == 0 {
                    format!("#{}", tag.tag)
                } else {
                    format!("#{}#{}", tag.tag, tag.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One tag's presence or value, optionally editable in place.
pub struct TagColumn {
    meta: ColumnMeta,
    /// The tag as written in the column name; empty for prototypes.
    dtag: String,
    is_value: bool,
    editable: bool,
}

impl TagColumn {
    pub fn new(name: &str, dtag: &str, is_value: bool, editable: bool) -> Self {
        let css = match (editable, is_value) {
            (false, false) => "pl_tag",
            (false, true) => "pl_tagval",
            (true, false) => "pl_edittag",
            (true, true) => "pl_edittagval",
        };
        Self {
            meta: ColumnMeta::new(name, ColumnFlags::VIEW_COLUMN | ColumnFlags::COMPLETABLE)
                .with_css(css)
                .with_sorter("tag"),
            dtag: dtag.to_string(),
            is_value,
            editable,
        }
    }

    /// Stands for every tag column in completion.
    pub fn prototype(editable: bool) -> Self {
        Self::new(if editable { "edit#" } else { "#" }, "", false, editable)
    }

    fn ctag(state: &ColumnState) -> Option<&str> {
        match state {
            ColumnState::Tag { ctag } => Some(ctag),
            _ => None,
        }
    }

    fn value(state: &ColumnState, row: &PaperRow) -> Option<i64> {
        Self::ctag(state).and_then(|ctag| row.tag_value(ctag))
    }

    fn sorts_first(&self, ctx: &ListContext) -> bool {
        ctx.sorters.first().is_some_and(|sorter| {
            let wanted = sorter.column.to_lowercase();
            let name = self.name().to_lowercase();
            !sorter.reverse && (wanted == name || format!("edit{wanted}") == name)
        })
    }
}

/// Builds tag columns for `tag:`, `tagval:`, `edittag:`, `edittagval:`,
/// `#` and `edit#` names.
pub fn make_tag_column(
    request: &FactoryRequest<'_>,
    _errors: &mut ColumnErrors,
) -> Option<Arc<dyn PaperColumn>> {
    let (is_value, editable) = match request.prefix {
        "tag:" | "#" => (false, false),
        "tagval:" => (true, false),
        "edittag:" => (false, true),
        "edittagval:" | "edit#" => (true, true),
        _ => return None,
    };
    let dtag = request.rest();
    if dtag.is_empty() {
        return None;
    }
    let column = TagColumn::new(request.name, dtag, is_value, editable);
    Some(request.registry.register_or_get(Arc::new(column)))
}

impl PaperColumn for TagColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Tag
    }

    fn prepare(&self, ctx: &mut ListContext, state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx.oracle.can_view_tags(&ctx.viewer, None, false) {
            return false;
        }
        if self.dtag.is_empty() && level == PrepareLevel::Completion {
            return true;
        }
        let Some(ctag) = canonical_tag(&self.dtag, ctx.viewer.contact_id) else {
            return false;
        };
        *state = ColumnState::Tag { ctag };
        if level.needs_data() {
            ctx.qopts.set_flag("tags");
        }
        if self.editable && level.is_displayed() {
            ctx.add_footer_html(
                "edittagajaxform",
                "<form id=\"edittagajaxform\" method=\"post\" action=\"paper?settags=1&amp;forceShow=1\" style=\"display:none\"><div><input type=\"hidden\" name=\"p\" /><input type=\"hidden\" name=\"addtags\" /><input type=\"hidden\" name=\"deltags\" /></div></form>",
            );
            if self.is_value && self.sorts_first(ctx) && !ctx.search.thenmap {
                let script = format!("add_edittag_ajax('{}')", escape_attr(&self.dtag));
                ctx.add_footer_script(script);
            } else {
                ctx.add_footer_script("add_edittag_ajax()");
            }
        }
        true
    }

    /// Untagged and unviewable rows sort last in either direction.
    fn sort_prepare(
        &self,
        ctx: &ListContext,
        state: &ColumnState,
        rows: &[PaperRow],
        sorter: &Sorter,
    ) -> Vec<SortKey> {
        let careful = !ctx.viewer.is_chair() && !ctx.settings.tag_seeall;
        let sign = if sorter.reverse { -1 } else { 1 };
        let unviewable = sign * UNVIEWABLE_TAG;
        let empty = if self.editable { sign * EMPTY_EDITABLE_TAG } else { unviewable };
        rows.iter()
            .map(|row| {
                if careful && !ctx.oracle.can_view_tags(&ctx.viewer, Some(row), true) {
                    SortKey::Int(unviewable)
                } else {
                    SortKey::Int(Self::value(state, row).unwrap_or(empty))
                }
            })
            .collect()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        format!("#{}", escape(&self.dtag))
    }

    fn completion_name(&self) -> Option<String> {
        if self.dtag.is_empty() {
            Some("#<tag>".to_string())
        } else {
            Some(format!("#{}", self.dtag))
        }
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        !ctx.oracle.can_view_tags(&ctx.viewer, Some(row), true)
    }

    fn content(
        &self,
        _ctx: &mut ListContext,
        state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let value = Self::value(state, row);
        if self.editable {
            let name = escape_attr(&format!("tag:{} {}", self.dtag, row.paper_id));
            return if self.is_value {
                let shown = value.map(|v| v.to_string()).unwrap_or_default();
                format!(
                    "<input type=\"text\" size=\"4\" name=\"{name}\" value=\"{shown}\" tabindex=\"6\" />"
                )
            } else {
                let checked = if value.is_some() { " checked" } else { "" };
                format!(
                    "<input type=\"checkbox\" class=\"cb\" name=\"{name}\" value=\"x\" tabindex=\"6\"{checked} />"
                )
            };
        }
        match value {
            None => String::new(),
            Some(0) if !self.is_value => "&#x2713;".to_string(),
            Some(v) => v.to_string(),
        }
    }

    fn text(&self, _ctx: &ListContext, state: &ColumnState, row: &PaperRow) -> String {
        match Self::value(state, row) {
            None => String::new(),
            Some(0) if !self.is_value => "X".to_string(),
            Some(v) => v.to_string(),
        }
    }
}

/// Which PC members put their private copy of a tag on a submission.
pub struct TagReportColumn {
    meta: ColumnMeta,
    tag: String,
}

impl TagReportColumn {
    pub fn new(tag: &str) -> Self {
        let mut name = String::from("tagrep_");
        let mut in_run = false;
        for ch in tag.chars() {
            if ch.is_alphanumeric() || ch == '_' {
                name.push(ch);
                in_run = false;
            } else if !in_run {
                name.push('_');
                in_run = true;
            }
        }
        Self {
            meta: ColumnMeta::new(name, ColumnFlags::VIEW_ROW | ColumnFlags::FOLDABLE)
                .with_css("pl_tagrep"),
            tag: tag.to_string(),
        }
    }

    fn entries(&self, ctx: &ListContext, row: &PaperRow) -> Vec<(String, i64)> {
        ctx.settings
            .pc_members
            .iter()
            .filter_map(|member| {
                let private = format!("{}~{}", member.contact_id, self.tag);
                row.tag_value(&private)
                    .map(|value| (contact_name_html(member), value))
            })
            .collect()
    }
}

impl PaperColumn for TagReportColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::TagReport
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx.viewer.is_chair() {
            return false;
        }
        if level.needs_data() {
            ctx.qopts.set_flag("tags");
        }
        true
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        format!("#~{} tags", escape(&self.tag))
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        !ctx.oracle.can_view_tags(&ctx.viewer, Some(row), true)
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        self.entries(ctx, row)
            .into_iter()
            .map(|(name, value)| {
                if value == 0 {
                    name
                } else {
                    format!("{name} (#{value})")
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_names_replace_non_word_runs() {
        assert_eq!(TagReportColumn::new("vote").name(), "tagrep_vote");
        assert_eq!(TagReportColumn::new("best-paper.2").name(), "tagrep_best_paper_2");
        assert_eq!(TagReportColumn::new("a--b").name(), "tagrep_a_b");
    }

    #[test]
    fn completion_names_use_hash_form() {
        let column = TagColumn::new("tag:accept", "accept", false, false);
        assert_eq!(column.completion_name().as_deref(), Some("#accept"));
        assert_eq!(
            TagColumn::prototype(false).completion_name().as_deref(),
            Some("#<tag>")
        );
    }

    #[test]
    fn tag_links_show_nonzero_values() {
        let tag = TagValue {
            tag: "order".to_string(),
            value: 3,
        };
        assert_eq!(
            tag_link(&tag, true),
            "<a class=\"qq nw hltag\" href=\"search?q=%23order\">#order#3</a>"
        );
    }
}
