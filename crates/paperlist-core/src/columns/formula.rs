//! Formula columns: saved formulas and expressions typed as column names.

use std::sync::Arc;

use paperlist_formula::{EvalMode, Formula, FormulaValue, ScoreInfo, Statistic};
use paperlist_model::{PaperRow, ViewScore};
use tracing::debug;

use super::common::{escape, escape_attr};
use crate::column::{ColumnFlags, ColumnKind, ColumnMeta, ColumnState, PaperColumn, PrepareLevel};
use crate::context::ListContext;
use crate::error::ColumnErrors;
use crate::registry::FactoryRequest;
use crate::sort::{SortKey, Sorter};

pub struct FormulaColumn {
    meta: ColumnMeta,
    /// `None` for the completion prototype.
    formula: Option<Arc<Formula>>,
}

impl FormulaColumn {
    pub fn new(name: &str, formula: Option<Arc<Formula>>) -> Self {
        Self {
            meta: ColumnMeta::new(
                name.to_lowercase(),
                ColumnFlags::VIEW_COLUMN
                    | ColumnFlags::FOLDABLE
                    | ColumnFlags::COMPLETABLE
                    | ColumnFlags::MINIMAL,
            )
            .with_css("pl_formula")
            .with_sorter("formula"),
            formula,
        }
    }

    /// Stands for ad-hoc formulas in completion.
    pub fn prototype() -> Self {
        Self::new("formula", None)
    }

    pub fn formula(&self) -> Option<&Arc<Formula>> {
        self.formula.as_ref()
    }

    fn evaluate(state: &ColumnState, row: &PaperRow, mode: EvalMode) -> FormulaValue {
        match state {
            ColumnState::Formula { function, .. } => function.evaluate(row, mode),
            _ => FormulaValue::Null,
        }
    }
}

/// Resolves formula names: saved formulas by name, then any expression that
/// checks. Parse errors are reported only for names that look like
/// expressions.
pub fn make_formula_column(
    request: &FactoryRequest<'_>,
    errors: &mut ColumnErrors,
) -> Option<Arc<dyn PaperColumn>> {
    if let Some(column) = request.registry.find_formula(request.name) {
        return Some(column);
    }
    if request.lname.starts_with("edit") {
        return None;
    }
    let formula = Formula::new(request.name, Arc::clone(request.settings()));
    if !formula.check() {
        if request.name.contains('(')
            && let Some(message) = formula.error_html()
        {
            errors.add(message, 1);
        }
        return None;
    }
    match request.registry.register_formula(Arc::new(formula)) {
        Ok(column) => Some(column),
        Err(error) => {
            debug!(name = request.name, %error, "formula column not registered");
            None
        }
    }
}

impl PaperColumn for FormulaColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Formula
    }

    fn prepare(&self, ctx: &mut ListContext, state: &mut ColumnState, level: PrepareLevel) -> bool {
        let Some(formula) = &self.formula else {
            return level == PrepareLevel::Completion;
        };
        let mut bound = ctx.oracle.permissive_view_score_bound(&ctx.viewer);
        if ctx.search.is_author_limit() {
            bound = bound.max(ViewScore::bound_below(ViewScore::AUTHOR));
        }
        if !ctx.scores_ok || !formula.check() || !formula.base_view_score().visible_above(bound) {
            return false;
        }
        let function = match formula.compile_function(&ctx.viewer, Arc::clone(&ctx.oracle)) {
            Ok(function) => function,
            Err(error) => {
                debug!(column = %self.name(), %error, "formula did not compile");
                return false;
            }
        };
        if level.needs_data() {
            formula.add_query_options(&mut ctx.qopts);
        }
        *state = ColumnState::Formula {
            function,
            statistics: ScoreInfo::new(),
        };
        true
    }

    /// Hidden values sort with nulls, ahead of every number.
    fn sort_prepare(
        &self,
        _ctx: &ListContext,
        state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        rows.iter()
            .map(|row| match Self::evaluate(state, row, EvalMode::SortKey).as_number() {
                Some(value) => SortKey::Float(value),
                None => SortKey::Null,
            })
            .collect()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        let Some(formula) = &self.formula else {
            return escape(self.name());
        };
        let heading = formula.column_header();
        let title = formula.heading_title();
        if !title.is_empty() && title != heading {
            format!(
                "<span class=\"need-tooltip\" data-tooltip=\"{}\">{}</span>",
                escape_attr(title),
                escape(heading)
            )
        } else {
            escape(heading)
        }
    }

    fn completion_name(&self) -> Option<String> {
        match &self.formula {
            Some(formula) if !formula.name().is_empty() => {
                let name = formula.name();
                if name.contains(' ') {
                    Some(format!("\"{name}\""))
                } else {
                    Some(name.to_string())
                }
            }
            _ => Some("(<formula>)".to_string()),
        }
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let ColumnState::Formula {
            function,
            statistics,
        } = state
        else {
            return String::new();
        };
        let value = function.evaluate(row, EvalMode::Raw);
        let conflicted = row.conflict_type(ctx.viewer.contact_id) > 0;
        if conflicted && ctx.oracle.allow_administer(&ctx.viewer, row) {
            let forced = function.evaluate(row, EvalMode::Forced);
            statistics.add(forced);
            format!(
                "<span class=\"fn5\">{}</span><span class=\"fx5\">{}</span>",
                value.to_html(),
                forced.to_html()
            )
        } else {
            statistics.add(value);
            value.to_html()
        }
    }

    fn text(&self, _ctx: &ListContext, state: &ColumnState, row: &PaperRow) -> String {
        Self::evaluate(state, row, EvalMode::Raw).to_text()
    }

    fn has_statistics(&self, state: &ColumnState) -> bool {
        matches!(state, ColumnState::Formula { statistics, .. } if statistics.count() > 0)
    }

    fn statistic(&self, state: &ColumnState, which: Statistic) -> String {
        match state {
            ColumnState::Formula { statistics, .. } => statistics.statistic(which).to_html(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperlist_model::{ConferenceSettings, Contact, RolePolicy};

    fn formula(expression: &str) -> Arc<Formula> {
        Arc::new(Formula::new(expression, Arc::new(ConferenceSettings::default())))
    }

    #[test]
    fn names_are_lowercased() {
        let column = FormulaColumn::new("FormulaX1", Some(formula("1+1")));
        assert_eq!(column.name(), "formulax1");
    }

    #[test]
    fn unnamed_formulas_complete_as_placeholder() {
        let column = FormulaColumn::new("formulax1", Some(formula("1+1")));
        assert_eq!(column.completion_name().as_deref(), Some("(<formula>)"));
        assert_eq!(
            FormulaColumn::prototype().completion_name().as_deref(),
            Some("(<formula>)")
        );
    }

    #[test]
    fn header_escapes_expression() {
        let column = FormulaColumn::new("formulax1", Some(formula("1<2")));
        let settings = Arc::new(ConferenceSettings::default());
        let ctx = ListContext::new(
            Contact::new(1, "Ada", "Lovelace"),
            Arc::new(RolePolicy::new(Arc::clone(&settings))),
            settings,
        );
        assert_eq!(column.header(&ctx, &ColumnState::Empty), "1&lt;2");
    }
}
