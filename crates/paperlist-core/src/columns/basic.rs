//! Selection, identity and plain submission fields.

use paperlist_model::{CONFLICT_AUTHOR, PaperRow};

use super::common::{escape, printable_time};
use crate::column::{ColumnFlags, ColumnKind, ColumnMeta, ColumnState, PaperColumn, PrepareLevel};
use crate::context::ListContext;
use crate::sort::{SortKey, Sorter};

/// Which checkbox a selector column renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorMode {
    /// Unchecked by default.
    Plain,
    /// Checked by default.
    On,
    /// Marks conflicts of the reviewer of interest; chairs only.
    Conflict,
    /// Blank on submissions the reviewer of interest is conflicted with.
    UnlessConflict,
}

pub struct SelectorColumn {
    meta: ColumnMeta,
    mode: SelectorMode,
}

impl SelectorColumn {
    pub fn new(name: &str, mode: SelectorMode) -> Self {
        let flags = match mode {
            SelectorMode::Conflict => ColumnFlags::VIEW_COLUMN,
            _ => ColumnFlags::VIEW_COLUMN | ColumnFlags::MINIMAL,
        };
        Self {
            meta: ColumnMeta::new(name, flags).with_css("pl_sel"),
            mode,
        }
    }

    fn checked(&self, ctx: &ListContext, row: &PaperRow) -> bool {
        let default = match self.mode {
            SelectorMode::On => true,
            SelectorMode::Conflict => row.conflict_type(ctx.reviewer_cid()) > 0,
            SelectorMode::Plain | SelectorMode::UnlessConflict => false,
        };
        ctx.paper_selection
            .as_ref()
            .and_then(|selection| selection.get(&row.paper_id).copied())
            .unwrap_or(default)
    }
}

impl PaperColumn for SelectorColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Selector
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, _level: PrepareLevel) -> bool {
        if self.mode == SelectorMode::Conflict && !ctx.viewer.is_chair() {
            return false;
        }
        if matches!(self.mode, SelectorMode::Conflict | SelectorMode::UnlessConflict) {
            let reviewer = i64::from(ctx.reviewer_cid().0);
            ctx.qopts.set_number("reviewer", reviewer);
        }
        if self.mode == SelectorMode::Conflict {
            ctx.add_footer_script("add_conflict_ajax()");
        }
        true
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        match self.mode {
            SelectorMode::Conflict => "Conflict?".to_string(),
            _ => String::new(),
        }
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let conflict = row.conflict_type(ctx.reviewer_cid());
        if self.mode == SelectorMode::UnlessConflict && conflict > 0 {
            return String::new();
        }
        ctx.any.sel = true;
        let checked = if self.checked(ctx, row) { " checked" } else { "" };
        let disabled = if self.mode == SelectorMode::Conflict && conflict >= CONFLICT_AUTHOR {
            " disabled"
        } else {
            ""
        };
        let class = if self.mode == SelectorMode::Conflict {
            "uix js-assign-review"
        } else {
            "uic js-selector"
        };
        format!(
            "<span class=\"pl_rownum fx6\">{}. </span><input type=\"checkbox\" class=\"{class}\" name=\"pap[]\" value=\"{}\"{checked}{disabled} />",
            ctx.count, row.paper_id
        )
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        if self.checked(ctx, row) { "X" } else { "" }.to_string()
    }
}

pub struct IdColumn {
    meta: ColumnMeta,
}

impl IdColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new(
                "id",
                ColumnFlags::VIEW_COLUMN | ColumnFlags::MINIMAL | ColumnFlags::COMPLETABLE,
            )
                .with_css("pl_id")
                .with_sorter("id"),
        }
    }
}

impl PaperColumn for IdColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Id
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "ID".to_string()
    }

    fn content(
        &self,
        _ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        format!(
            "<a href=\"paper/{id}\" class=\"pnum\" tabindex=\"4\">#{id}</a>",
            id = row.paper_id
        )
    }

    fn text(&self, _ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        row.paper_id.to_string()
    }
}

pub struct TitleColumn {
    meta: ColumnMeta,
}

impl TitleColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new(
                "title",
                ColumnFlags::VIEW_COLUMN | ColumnFlags::MINIMAL | ColumnFlags::COMPLETABLE,
            )
                .with_css("pl_title")
                .with_sorter("title"),
        }
    }
}

impl PaperColumn for TitleColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Title
    }

    fn sort_prepare(
        &self,
        _ctx: &ListContext,
        _state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        rows.iter()
            .map(|row| SortKey::Text(row.title.to_lowercase()))
            .collect()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Title".to_string()
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let (title, _) = ctx.highlight("title", &row.title);
        format!(
            "<a href=\"paper/{}\" class=\"ptitle\" tabindex=\"5\">{title}</a>",
            row.paper_id
        )
    }

    fn text(&self, _ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        row.title.clone()
    }
}

pub struct AbstractColumn {
    meta: ColumnMeta,
}

impl AbstractColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new(
                "abstract",
                ColumnFlags::VIEW_ROW | ColumnFlags::FOLDABLE | ColumnFlags::COMPLETABLE,
            )
            .with_css("pl_abstract"),
        }
    }
}

impl PaperColumn for AbstractColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Abstract
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Abstract".to_string()
    }

    fn content_empty(&self, _ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        row.abstract_text.is_empty()
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        ctx.highlight("abstract", &row.abstract_text).0
    }

    fn text(&self, _ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        row.abstract_text.clone()
    }
}

/// Latest submission time of the current version.
pub struct TimestampColumn {
    meta: ColumnMeta,
}

impl TimestampColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new("timestamp", ColumnFlags::VIEW_COLUMN | ColumnFlags::COMPLETABLE)
                .with_css("pl_timestamp")
                .with_sorter("timestamp"),
        }
    }
}

impl PaperColumn for TimestampColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Timestamp
    }

    fn sort_prepare(
        &self,
        _ctx: &ListContext,
        _state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        rows.iter()
            .map(|row| SortKey::Int(-row.latest_submission_time()))
            .collect()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Timestamp".to_string()
    }

    fn content_empty(&self, _ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        row.latest_submission_time() <= 0
    }

    fn content(
        &self,
        _ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        escape(&printable_time(row.latest_submission_time()))
    }

    fn text(&self, _ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        printable_time(row.latest_submission_time())
    }
}

/// Asks the page to start with every foldable section folded.
pub struct FoldAllColumn {
    meta: ColumnMeta,
}

impl FoldAllColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new("foldall", ColumnFlags::NONE),
        }
    }
}

impl PaperColumn for FoldAllColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::FoldAll
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, _level: PrepareLevel) -> bool {
        ctx.qopts.set_flag("foldall");
        true
    }
}

/// Orders rows by an explicit position list supplied with the request.
pub struct NumericOrderColumn {
    meta: ColumnMeta,
}

impl NumericOrderColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new("numericorder", ColumnFlags::NONE).with_sorter("numericorder"),
        }
    }
}

impl PaperColumn for NumericOrderColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::NumericOrder
    }

    fn sort_prepare(
        &self,
        ctx: &ListContext,
        _state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        rows.iter()
            .map(|row| match ctx.numeric_position(row.paper_id) {
                Some(position) => SortKey::Int(position),
                None => SortKey::Int(i64::MAX),
            })
            .collect()
    }
}
