//! The listing pipeline.
//!
//! # Architecture
//!
//! [`PaperList::render`] runs one listing request through strictly ordered
//! phases, each inside its own tracing span:
//!
//! 1. **resolve** - requested column and sorter names are looked up in the
//!    [`ColumnRegistry`]; unknown names are collected in [`ColumnErrors`]
//! 2. **prepare** - every resolved column decides whether it takes part and
//!    records the data it needs; the active set is fixed after this phase
//! 3. **fetch** - rows are read from the [`RecordStore`] once, with the
//!    merged query options
//! 4. **analyze** - active columns see the whole batch once
//! 5. **sort** - each sorter's keys are computed into a [`SortKeyTable`] and
//!    rows are ordered by the sorter chain, then by submission id
//! 6. **render** - headers, cells and footer statistics are produced
//!
//! Columns are shared and immutable. Everything a column learns during a
//! request lives in its [`ColumnState`] slot, owned by the pipeline.
//!
//! # Example
//!
//! ```ignore
//! use paperlist_core::{ListContext, MemoryStore, PaperList, build_default_registry};
//!
//! let registry = build_default_registry(settings.clone())?;
//! let store = MemoryStore::new(rows);
//! let mut ctx = ListContext::new(viewer, oracle, settings);
//! let listing = PaperList::new(&registry, &store).render(&mut ctx, &["id", "title"])?;
//! ```

use std::cmp::Ordering;
use std::sync::Arc;

use paperlist_formula::Statistic;
use paperlist_model::{PaperId, PaperRow, QueryOptions};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::column::{ColumnKind, ColumnState, PaperColumn, PrepareLevel};
use crate::context::{AnyFlags, ListContext};
use crate::error::{ColumnErrors, ListError};
use crate::registry::ColumnRegistry;
use crate::sort::{SortKeyTable, Sorter};
use crate::store::RecordStore;

/// A column as it appears in a rendered listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedColumn {
    pub name: String,
    pub header: String,
    pub kind: ColumnKind,
    pub css_class: String,
    /// Rendered below the row rather than as a table column.
    pub is_row: bool,
    /// Folded away by the viewer; cells are left empty.
    pub folded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedCell {
    /// Cell markup; `None` when the cell is empty.
    pub content: Option<String>,
    /// Plain-text form for exports.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRow {
    pub paper_id: PaperId,
    /// One cell per rendered column, in column order.
    pub cells: Vec<RenderedCell>,
}

/// Footer summary of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnStatistics {
    pub column: String,
    /// Label and formatted value of each footer statistic.
    pub values: Vec<(String, String)>,
}

/// Everything a listing request produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedList {
    pub columns: Vec<RenderedColumn>,
    pub rows: Vec<RenderedRow>,
    pub statistics: Vec<ColumnStatistics>,
    pub any: AnyFlags,
    pub footer_scripts: Vec<String>,
    pub footer_html: Vec<String>,
    pub errors: ColumnErrors,
    pub query_options: QueryOptions,
}

impl RenderedList {
    /// Index of the column named `name`, ignoring case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(name))
    }

    /// Cell of `paper` in the column named `name`.
    pub fn cell(&self, paper: PaperId, name: &str) -> Option<&RenderedCell> {
        let index = self.column_index(name)?;
        self.rows
            .iter()
            .find(|row| row.paper_id == paper)
            .and_then(|row| row.cells.get(index))
    }

    pub fn paper_ids(&self) -> Vec<PaperId> {
        self.rows.iter().map(|row| row.paper_id).collect()
    }
}

/// One prepared column with its request state.
struct ActiveColumn {
    column: Arc<dyn PaperColumn>,
    state: ColumnState,
    level: PrepareLevel,
    /// Requested for display, as opposed to only sorting.
    displayed: bool,
}

/// A sorter bound to the active column it reads.
struct ActiveSorter {
    sorter: Sorter,
    slot: usize,
}

/// Runs listing requests against a registry and a record store.
pub struct PaperList<'a> {
    registry: &'a ColumnRegistry,
    store: &'a dyn RecordStore,
}

impl<'a> PaperList<'a> {
    pub fn new(registry: &'a ColumnRegistry, store: &'a dyn RecordStore) -> Self {
        Self { registry, store }
    }

    /// Renders `names` for the viewer in `ctx`.
    ///
    /// Unknown columns and columns that decline to take part are left out;
    /// the former are reported in [`RenderedList::errors`].
    ///
    /// # Errors
    ///
    /// Returns [`ListError::Store`] when the record store fails.
    pub fn render(
        &self,
        ctx: &mut ListContext,
        names: &[String],
    ) -> Result<RenderedList, ListError> {
        let span = info_span!("paper_list", viewer = %ctx.viewer.contact_id, columns = names.len());
        let _guard = span.enter();

        let mut errors = ColumnErrors::new();
        let (requested, sort_only) = {
            let _phase = info_span!("resolve").entered();
            self.resolve(ctx, names, &mut errors)
        };

        let (mut active, sorters) = {
            let _phase = info_span!("prepare").entered();
            Self::prepare(ctx, requested, sort_only)
        };

        let mut rows = {
            let _phase = info_span!("fetch").entered();
            let rows = self.store.fetch(&ctx.qopts)?;
            debug!(rows = rows.len(), "fetched rows");
            rows
        };

        {
            let _phase = info_span!("analyze").entered();
            for entry in &mut active {
                entry
                    .column
                    .analyze(ctx, &mut entry.state, &rows, self.store)?;
            }
        }

        {
            let _phase = info_span!("sort", sorters = sorters.len()).entered();
            Self::sort(ctx, &active, &sorters, &mut rows);
        }

        let _phase = info_span!("render", rows = rows.len()).entered();
        let listing = Self::render_rows(ctx, &mut active, &rows, errors);
        info!(
            rows = listing.rows.len(),
            columns = listing.columns.len(),
            "rendered paper list"
        );
        Ok(listing)
    }

    /// Looks up displayed columns, then the columns sorters name.
    fn resolve(
        &self,
        ctx: &ListContext,
        names: &[String],
        errors: &mut ColumnErrors,
    ) -> (Vec<Arc<dyn PaperColumn>>, Vec<(Sorter, Arc<dyn PaperColumn>)>) {
        let mut requested = Vec::new();
        for name in names {
            match self.registry.lookup(name, errors) {
                Some(column) => requested.push(column),
                None => {
                    warn!(name = %name, "no such column");
                    errors.add(format!("No such column “{}”.", html_escape::encode_text(name)), 0);
                }
            }
        }
        let mut sort_only = Vec::new();
        for sorter in &ctx.sorters {
            match self.registry.lookup(&sorter.column, errors) {
                Some(column) => sort_only.push((sorter.clone(), column)),
                None => {
                    warn!(sorter = %sorter.column, "no such sort column");
                    errors.add(
                        format!(
                            "No such sort column “{}”.",
                            html_escape::encode_text(&sorter.column)
                        ),
                        0,
                    );
                }
            }
        }
        (requested, sort_only)
    }

    /// Prepares every resolved column once and fixes the active set.
    fn prepare(
        ctx: &mut ListContext,
        requested: Vec<Arc<dyn PaperColumn>>,
        sort_columns: Vec<(Sorter, Arc<dyn PaperColumn>)>,
    ) -> (Vec<ActiveColumn>, Vec<ActiveSorter>) {
        let mut active: Vec<ActiveColumn> = Vec::new();
        let mut declined: Vec<Arc<dyn PaperColumn>> = Vec::new();
        let sorted = |column: &Arc<dyn PaperColumn>| {
            sort_columns
                .iter()
                .any(|(_, sort_column)| Arc::ptr_eq(sort_column, column))
        };

        for column in requested {
            let seen = active.iter().any(|entry| Arc::ptr_eq(&entry.column, &column))
                || declined.iter().any(|other| Arc::ptr_eq(other, &column));
            if seen {
                continue;
            }
            let folded = column.meta().is_foldable() && ctx.is_folded(column.name());
            let level = if folded && !sorted(&column) {
                PrepareLevel::Folded
            } else {
                PrepareLevel::Visible
            };
            let mut state = ColumnState::Empty;
            if column.prepare(ctx, &mut state, level) {
                active.push(ActiveColumn {
                    column,
                    state,
                    level: if folded { PrepareLevel::Folded } else { level },
                    displayed: true,
                });
            } else {
                debug!(column = %column.name(), "column declined");
                declined.push(column);
            }
        }

        let mut sorters = Vec::new();
        for (sorter, column) in sort_columns {
            if declined.iter().any(|other| Arc::ptr_eq(other, &column)) {
                continue;
            }
            let slot = match active
                .iter()
                .position(|entry| Arc::ptr_eq(&entry.column, &column))
            {
                Some(slot) => slot,
                None => {
                    let mut state = ColumnState::Empty;
                    if !column.prepare(ctx, &mut state, PrepareLevel::Sort) {
                        debug!(column = %column.name(), "sort column declined");
                        declined.push(column);
                        continue;
                    }
                    active.push(ActiveColumn {
                        column,
                        state,
                        level: PrepareLevel::Sort,
                        displayed: false,
                    });
                    active.len() - 1
                }
            };
            sorters.push(ActiveSorter { sorter, slot });
        }
        (active, sorters)
    }

    fn sort(
        ctx: &ListContext,
        active: &[ActiveColumn],
        sorters: &[ActiveSorter],
        rows: &mut [PaperRow],
    ) {
        let mut keys = SortKeyTable::new();
        for entry in sorters {
            let column = &active[entry.slot];
            let computed = column
                .column
                .sort_prepare(ctx, &column.state, rows, &entry.sorter);
            for (row, key) in rows.iter().zip(computed) {
                keys.insert(entry.sorter.handle, row.paper_id, key);
            }
        }
        rows.sort_by(|a, b| {
            for entry in sorters {
                let column = &active[entry.slot].column;
                let handle = entry.sorter.handle;
                let mut order =
                    column.compare(keys.get(handle, a.paper_id), keys.get(handle, b.paper_id), &entry.sorter);
                if entry.sorter.reverse {
                    order = order.reverse();
                }
                if order != Ordering::Equal {
                    return order;
                }
            }
            a.paper_id.cmp(&b.paper_id)
        });
    }

    fn render_rows(
        ctx: &mut ListContext,
        active: &mut [ActiveColumn],
        rows: &[PaperRow],
        errors: ColumnErrors,
    ) -> RenderedList {
        let shown: Vec<usize> = (0..active.len())
            .filter(|index| active[*index].displayed)
            .collect();

        let columns = shown
            .iter()
            .map(|index| {
                let entry = &active[*index];
                let meta = entry.column.meta();
                RenderedColumn {
                    name: meta.name.clone(),
                    header: entry.column.header(ctx, &entry.state),
                    kind: entry.column.kind(),
                    css_class: meta.css_class.clone(),
                    is_row: meta.is_row(),
                    folded: entry.level == PrepareLevel::Folded,
                }
            })
            .collect();

        let mut rendered = Vec::with_capacity(rows.len());
        for (rowidx, row) in rows.iter().enumerate() {
            ctx.count = rowidx + 1;
            let mut cells = Vec::with_capacity(shown.len());
            for index in &shown {
                let entry = &mut active[*index];
                if entry.level == PrepareLevel::Folded
                    || entry.column.content_empty(ctx, &entry.state, row)
                {
                    cells.push(RenderedCell::default());
                    continue;
                }
                let content = entry.column.content(ctx, &mut entry.state, row, rowidx);
                let text = entry.column.text(ctx, &entry.state, row);
                cells.push(RenderedCell {
                    content: (!content.is_empty()).then_some(content),
                    text,
                });
            }
            rendered.push(RenderedRow {
                paper_id: row.paper_id,
                cells,
            });
        }

        let statistics = shown
            .iter()
            .map(|index| &active[*index])
            .filter(|entry| entry.column.has_statistics(&entry.state))
            .map(|entry| ColumnStatistics {
                column: entry.column.name().to_string(),
                values: Statistic::FOOTER
                    .iter()
                    .map(|which| {
                        (
                            which.label().to_string(),
                            entry.column.statistic(&entry.state, *which),
                        )
                    })
                    .collect(),
            })
            .collect();

        RenderedList {
            columns,
            rows: rendered,
            statistics,
            any: ctx.any,
            footer_scripts: ctx.footer_scripts().to_vec(),
            footer_html: ctx.footer_html().map(str::to_string).collect(),
            errors,
            query_options: ctx.qopts.clone(),
        }
    }
}
