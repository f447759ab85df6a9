//! Dynamic columns for paper listings.
//!
//! A [`ColumnRegistry`] maps column names to shared [`PaperColumn`]
//! definitions. Names not registered directly are built on demand by
//! factories: `#tag` and `tagval:tag` for tag columns, review field
//! abbreviations for score columns, and any well-formed expression for formula
//! columns. [`build_default_registry`] installs the standard catalogue.
//!
//! A [`PaperList`] renders one request: it resolves the requested names,
//! prepares the columns for the viewer in a [`ListContext`], fetches rows from
//! a [`RecordStore`], sorts them and produces a [`RenderedList`].

pub mod column;
pub mod columns;
pub mod context;
pub mod defaults;
pub mod error;
pub mod list;
pub mod registry;
pub mod sort;
pub mod store;

pub use column::{ColumnFlags, ColumnKind, ColumnMeta, ColumnState, PaperColumn, PrepareLevel};
pub use context::{AnyFlags, ListContext, ListOptions};
pub use defaults::build_default_registry;
pub use error::{ColumnErrors, ListError, RegistryError};
pub use list::{
    ColumnStatistics, PaperList, RenderedCell, RenderedColumn, RenderedList, RenderedRow,
};
pub use registry::{ColumnFactory, ColumnRegistry, FactoryRequest};
pub use sort::{ScoreSortMethod, SortKey, SortKeyTable, SortSpec, Sorter, SorterHandle};
pub use store::{MemoryStore, RecordStore, ReviewerRow, StoreError};
