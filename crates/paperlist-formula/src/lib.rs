//! Formula language for computed listing columns.
//!
//! A [`Formula`] is parsed once, on the first call to [`Formula::check`],
//! and resolved against the conference's review form. Binding it to a viewer
//! with [`Formula::compile_function`] produces a [`CompiledFormula`] that can
//! be evaluated on every row of a listing.
//!
//! ```text
//! avg(OveMer) >= 3 && #accept ? round(avg(OveMer), 1) : null
//! ```
//!
//! Values the viewer may not see evaluate to [`FormulaValue::Hidden`], which
//! propagates through every operator and renders as `?`.

pub mod ast;
pub mod error;
pub mod eval;
pub mod formula;
pub mod lexer;
pub mod parser;
pub mod score_info;
pub mod value;

pub use error::FormulaError;
pub use eval::{CompiledFormula, EvalMode};
pub use formula::Formula;
pub use score_info::{ScoreInfo, Statistic};
pub use value::{FormulaValue, HIDDEN_SENTINEL, format_number};
