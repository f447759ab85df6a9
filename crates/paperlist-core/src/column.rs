//! The column trait and the metadata shared by every column.
//!
//! # Architecture
//!
//! A [`PaperColumn`] is an immutable definition registered once in a
//! [`ColumnRegistry`](crate::registry::ColumnRegistry) and shared across
//! requests. Everything a column learns while serving one listing (the
//! compiled formula, the canonical tag, the reviewer of interest, running
//! statistics) lives in a [`ColumnState`] owned by that listing, so concurrent
//! requests never observe each other.
//!
//! A listing drives each column through the same lifecycle:
//!
//! 1. [`prepare`](PaperColumn::prepare) decides whether the column takes part
//!    and records the data it needs in the context's query options.
//! 2. [`analyze`](PaperColumn::analyze) sees the fetched rows once.
//! 3. [`sort_prepare`](PaperColumn::sort_prepare) and
//!    [`compare`](PaperColumn::compare) order the rows, for sorter columns.
//! 4. [`header`](PaperColumn::header), [`content_empty`](PaperColumn::content_empty),
//!    [`content`](PaperColumn::content) and [`text`](PaperColumn::text) render.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use paperlist_formula::{CompiledFormula, ScoreInfo, Statistic};
use paperlist_model::{Contact, PaperId, PaperRow, ReviewField};
use serde::Serialize;

use crate::context::ListContext;
use crate::registry::ColumnRegistry;
use crate::sort::{SortKey, Sorter};
use crate::store::{RecordStore, ReviewerRow, StoreError};

/// Placement and behavior bits of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnFlags(u8);

impl ColumnFlags {
    pub const NONE: Self = Self(0);
    /// Rendered as a table column.
    pub const VIEW_COLUMN: Self = Self(1);
    /// Rendered beneath the row, spanning the table.
    pub const VIEW_ROW: Self = Self(2);
    /// May be folded away by the viewer.
    pub const FOLDABLE: Self = Self(4);
    /// Offered in column-name completion.
    pub const COMPLETABLE: Self = Self(8);
    /// Shown in the compact listing.
    pub const MINIMAL: Self = Self(16);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ColumnFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// How much of a column a listing will use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareLevel {
    /// Used only to order rows.
    Sort,
    /// Displayed but folded away.
    Folded,
    Visible,
    /// Prepared only to produce a completion name.
    Completion,
}

impl PrepareLevel {
    /// Every level except [`PrepareLevel::Folded`] reads row data.
    pub fn needs_data(self) -> bool {
        self != PrepareLevel::Folded
    }

    pub fn is_displayed(self) -> bool {
        matches!(self, PrepareLevel::Visible | PrepareLevel::Completion)
    }
}

/// The kinds of column this crate knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Selector,
    Id,
    Title,
    Status,
    ReviewStatus,
    ReviewerType,
    ReviewSubmitted,
    ReviewDelegation,
    AssignReview,
    TopicScore,
    TopicList,
    Preference,
    PreferenceList,
    Desirability,
    ReviewerList,
    Authors,
    Collaborators,
    Abstract,
    TagList,
    Tag,
    TagReport,
    Score,
    Formula,
    Lead,
    Shepherd,
    PcConflicts,
    ConflictMatch,
    Timestamp,
    FoldAll,
    NumericOrder,
}

/// Registration-time description of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMeta {
    pub name: String,
    pub flags: ColumnFlags,
    /// CSS class for the rendered cells.
    pub css_class: String,
    /// Name of the ordering this column provides, if it can sort.
    pub sorter: Option<&'static str>,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, flags: ColumnFlags) -> Self {
        let name = name.into();
        Self {
            css_class: name.clone(),
            name,
            flags,
            sorter: None,
        }
    }

    pub fn with_css(mut self, css_class: &str) -> Self {
        self.css_class = css_class.to_string();
        self
    }

    pub fn with_sorter(mut self, sorter: &'static str) -> Self {
        self.sorter = Some(sorter);
        self
    }

    pub fn is_completable(&self) -> bool {
        self.flags.contains(ColumnFlags::COMPLETABLE)
    }

    pub fn is_foldable(&self) -> bool {
        self.flags.contains(ColumnFlags::FOLDABLE)
    }

    pub fn is_row(&self) -> bool {
        self.flags.contains(ColumnFlags::VIEW_ROW)
    }

    /// Shown in the minimal listing form.
    pub fn is_minimal(&self) -> bool {
        self.flags.contains(ColumnFlags::MINIMAL)
    }
}

/// Per-listing state of one column.
#[derive(Debug, Default)]
pub enum ColumnState {
    #[default]
    Empty,
    Authors {
        full: bool,
    },
    Tag {
        ctag: String,
    },
    Score {
        field: ReviewField,
    },
    Formula {
        function: CompiledFormula,
        statistics: ScoreInfo,
    },
    ReviewerType {
        xreviewer: Option<Contact>,
        rows: BTreeMap<PaperId, ReviewerRow>,
    },
    PreferenceList {
        topics: bool,
    },
}

/// A listing column.
///
/// Implementors must be immutable: per-listing data belongs in the
/// [`ColumnState`] passed to each call. Default method bodies describe a
/// column that always participates, sorts by submission id and renders
/// nothing.
pub trait PaperColumn: Send + Sync {
    fn meta(&self) -> &ColumnMeta;

    fn kind(&self) -> ColumnKind;

    fn name(&self) -> &str {
        &self.meta().name
    }

    /// Decides whether the column takes part in this listing.
    ///
    /// Returning `false` drops the column silently. Columns that read row
    /// data record it in `ctx.qopts` when `level.needs_data()`.
    fn prepare(&self, _ctx: &mut ListContext, _state: &mut ColumnState, _level: PrepareLevel) -> bool {
        true
    }

    /// Sees the fetched rows once before sorting and rendering.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when a follow-up fetch fails.
    fn analyze(
        &self,
        _ctx: &ListContext,
        _state: &mut ColumnState,
        _rows: &[PaperRow],
        _store: &dyn RecordStore,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    /// Computes one sort key per row, in row order.
    fn sort_prepare(
        &self,
        _ctx: &ListContext,
        _state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        rows.iter()
            .map(|row| SortKey::Int(i64::from(row.paper_id.0)))
            .collect()
    }

    /// Orders two keys produced by [`sort_prepare`](Self::sort_prepare).
    ///
    /// The listing applies `sorter.reverse` afterwards.
    fn compare(&self, a: &SortKey, b: &SortKey, _sorter: &Sorter) -> Ordering {
        a.cmp(b)
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        format!("&lt;{}&gt;", html_escape::encode_text(self.name()))
    }

    /// Name offered in completion, for completable columns.
    fn completion_name(&self) -> Option<String> {
        self.meta()
            .is_completable()
            .then(|| self.name().to_string())
    }

    /// Concrete columns a prototype stands for in completion.
    ///
    /// `None` means the column stands for itself.
    fn completion_instances(&self, _registry: &ColumnRegistry) -> Option<Vec<Arc<dyn PaperColumn>>> {
        None
    }

    /// Whether the row has nothing to show; checked before `content`.
    fn content_empty(&self, _ctx: &ListContext, _state: &ColumnState, _row: &PaperRow) -> bool {
        false
    }

    fn content(
        &self,
        _ctx: &mut ListContext,
        _state: &mut ColumnState,
        _row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        String::new()
    }

    /// Plain-text rendering for exports.
    fn text(&self, _ctx: &ListContext, _state: &ColumnState, _row: &PaperRow) -> String {
        String::new()
    }

    fn has_statistics(&self, _state: &ColumnState) -> bool {
        false
    }

    fn statistic(&self, _state: &ColumnState, _which: Statistic) -> String {
        String::new()
    }
}

impl fmt::Debug for dyn PaperColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaperColumn")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine() {
        let flags = ColumnFlags::VIEW_COLUMN | ColumnFlags::COMPLETABLE;
        assert!(flags.contains(ColumnFlags::VIEW_COLUMN));
        assert!(flags.contains(ColumnFlags::COMPLETABLE));
        assert!(!flags.contains(ColumnFlags::FOLDABLE));
        assert!(flags.contains(ColumnFlags::NONE));
    }

    #[test]
    fn folded_columns_read_no_data() {
        assert!(!PrepareLevel::Folded.needs_data());
        assert!(PrepareLevel::Sort.needs_data());
        assert!(!PrepareLevel::Sort.is_displayed());
        assert!(PrepareLevel::Completion.is_displayed());
    }
}
