use std::sync::{Arc, OnceLock};

use paperlist_model::{
    CapabilityOracle, ConferenceSettings, Contact, QueryOptions, SavedFormula, ViewScore,
};
use tracing::debug;

use crate::ast::Expr;
use crate::error::FormulaError;
use crate::eval::CompiledFormula;
use crate::parser::{Needs, parse};

#[derive(Debug)]
struct Checked {
    expr: Arc<Expr>,
    view_score: ViewScore,
    needs: Needs,
}

/// A formula expression, parsed on first use and cached.
#[derive(Debug)]
pub struct Formula {
    formula_id: Option<u32>,
    name: String,
    expression: String,
    heading_title: String,
    settings: Arc<ConferenceSettings>,
    checked: OnceLock<Result<Checked, FormulaError>>,
}

impl Formula {
    /// An unnamed formula typed directly into a search.
    pub fn new(expression: &str, settings: Arc<ConferenceSettings>) -> Self {
        Self {
            formula_id: None,
            name: String::new(),
            expression: expression.trim().to_string(),
            heading_title: String::new(),
            settings,
            checked: OnceLock::new(),
        }
    }

    pub fn saved(saved: &SavedFormula, settings: Arc<ConferenceSettings>) -> Self {
        Self {
            formula_id: Some(saved.id),
            name: saved.name.clone(),
            expression: saved.expression.clone(),
            heading_title: saved.heading_title.clone(),
            settings,
            checked: OnceLock::new(),
        }
    }

    pub fn formula_id(&self) -> Option<u32> {
        self.formula_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn heading_title(&self) -> &str {
        &self.heading_title
    }

    fn checked(&self) -> &Result<Checked, FormulaError> {
        self.checked.get_or_init(|| {
            let result = parse(&self.expression, &self.settings).map(|parsed| Checked {
                expr: Arc::new(parsed.expr),
                view_score: parsed.view_score,
                needs: parsed.needs,
            });
            if let Err(error) = &result {
                debug!(expression = %self.expression, %error, "formula rejected");
            }
            result
        })
    }

    /// Parses and resolves the formula once; later calls reuse the result.
    pub fn check(&self) -> bool {
        self.checked().is_ok()
    }

    pub fn error(&self) -> Option<&FormulaError> {
        self.checked().as_ref().err()
    }

    pub fn error_html(&self) -> Option<String> {
        self.error().map(|error| {
            format!(
                "Formula <code>{}</code>: {}",
                html_escape::encode_text(&self.expression),
                html_escape::encode_text(&error.to_string())
            )
        })
    }

    /// Lowest view score among the values the formula reads.
    ///
    /// A viewer whose bound is at or above this can never see a result.
    /// Formulas that fail to check report [`ViewScore::FALSE`].
    pub fn base_view_score(&self) -> ViewScore {
        match self.checked() {
            Ok(checked) => checked.view_score,
            Err(_) => ViewScore::FALSE,
        }
    }

    pub fn compile_function(
        &self,
        viewer: &Contact,
        oracle: Arc<dyn CapabilityOracle>,
    ) -> Result<CompiledFormula, FormulaError> {
        match self.checked() {
            Ok(checked) => Ok(CompiledFormula::new(
                Arc::clone(&checked.expr),
                viewer.clone(),
                oracle,
                Arc::clone(&self.settings),
            )),
            Err(error) => Err(error.clone()),
        }
    }

    /// Records the data this formula reads.
    pub fn add_query_options(&self, options: &mut QueryOptions) {
        let Ok(checked) = self.checked() else {
            return;
        };
        for flag in &checked.needs.flags {
            options.set_flag(flag);
        }
        for field in &checked.needs.scores {
            options.add_to_set("scores", field);
        }
    }

    pub fn column_header(&self) -> &str {
        if self.name.is_empty() {
            &self.expression
        } else {
            &self.name
        }
    }

    /// Whether `name` refers to this formula, by saved name or expression.
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.trim();
        (!self.name.is_empty() && self.name.eq_ignore_ascii_case(name))
            || self.expression.eq_ignore_ascii_case(name)
    }
}
