//! Evaluation of checked formulas against submissions.

use std::sync::Arc;

use paperlist_model::{
    CapabilityOracle, ConferenceSettings, Contact, PaperRow, ReviewRow, ViewScore, tags,
};

use crate::ast::{AggregateKind, Attribute, Expr, ScalarFn};
use crate::lexer::Op;
use crate::score_info::ScoreInfo;
use crate::value::FormulaValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    /// Value as shown in a cell.
    Raw,
    /// Value used as a sort key; hidden values sort as null.
    SortKey,
    /// Administrator view that overrides conflicts, used for statistics.
    Forced,
}

/// A formula bound to one viewer.
///
/// Holds no per-row state, so one instance evaluates every row of a listing.
#[derive(Clone)]
pub struct CompiledFormula {
    expr: Arc<Expr>,
    viewer: Contact,
    oracle: Arc<dyn CapabilityOracle>,
    settings: Arc<ConferenceSettings>,
}

impl std::fmt::Debug for CompiledFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFormula")
            .field("expr", &self.expr)
            .field("viewer", &self.viewer.contact_id)
            .finish_non_exhaustive()
    }
}

struct Scope<'r> {
    paper: &'r PaperRow,
    force: bool,
    bound: ViewScore,
    review: Option<&'r ReviewRow>,
}

impl<'r> Scope<'r> {
    fn with_review(&self, review: &'r ReviewRow) -> Scope<'r> {
        Scope {
            paper: self.paper,
            force: self.force,
            bound: self.bound,
            review: Some(review),
        }
    }
}

impl CompiledFormula {
    pub(crate) fn new(
        expr: Arc<Expr>,
        viewer: Contact,
        oracle: Arc<dyn CapabilityOracle>,
        settings: Arc<ConferenceSettings>,
    ) -> Self {
        Self {
            expr,
            viewer,
            oracle,
            settings,
        }
    }

    pub fn evaluate(&self, paper: &PaperRow, mode: EvalMode) -> FormulaValue {
        let force = mode == EvalMode::Forced;
        let scope = Scope {
            paper,
            force,
            bound: self.oracle.view_score_bound(&self.viewer, paper, force),
            review: None,
        };
        match self.eval(&self.expr, &scope) {
            FormulaValue::Hidden if mode == EvalMode::SortKey => FormulaValue::Null,
            value => value,
        }
    }

    fn eval(&self, expr: &Expr, scope: &Scope<'_>) -> FormulaValue {
        match expr {
            Expr::Constant(value) => *value,
            Expr::Unary(op, operand) => unary(*op, self.eval(operand, scope)),
            Expr::Binary(Op::And, left, right) => {
                let left = self.eval(left, scope);
                if left.is_hidden() || !left.is_truthy() {
                    left
                } else {
                    self.eval(right, scope)
                }
            }
            Expr::Binary(Op::Or, left, right) => {
                let left = self.eval(left, scope);
                if left.is_hidden() || left.is_truthy() {
                    left
                } else {
                    self.eval(right, scope)
                }
            }
            Expr::Binary(op, left, right) => {
                binary(*op, self.eval(left, scope), self.eval(right, scope))
            }
            Expr::Ternary(condition, then, otherwise) => {
                let condition = self.eval(condition, scope);
                if condition.is_hidden() {
                    FormulaValue::Hidden
                } else if condition.is_truthy() {
                    self.eval(then, scope)
                } else {
                    self.eval(otherwise, scope)
                }
            }
            Expr::Call(function, args) => {
                let values: Vec<FormulaValue> =
                    args.iter().map(|arg| self.eval(arg, scope)).collect();
                call(*function, &values)
            }
            Expr::Aggregate(kind, inner) => self.aggregate(*kind, inner, scope),
            Expr::Attribute(attribute) => self.attribute(*attribute, scope),
            Expr::Tag(tag) => self.tag(tag, scope),
            Expr::Score {
                field_id,
                view_score,
            } => self.score(field_id, *view_score, scope),
        }
    }

    fn aggregate(&self, kind: AggregateKind, inner: &Expr, scope: &Scope<'_>) -> FormulaValue {
        if kind == AggregateKind::My {
            return match scope.paper.review_by(self.viewer.contact_id) {
                Some(own) => self.eval(inner, &scope.with_review(own)),
                None => FormulaValue::Null,
            };
        }

        let mut values = Vec::new();
        for review in &scope.paper.reviews {
            match self.eval(inner, &scope.with_review(review)) {
                FormulaValue::Hidden => return FormulaValue::Hidden,
                FormulaValue::Null => {}
                value => values.push(value),
            }
        }

        let mut info = ScoreInfo::new();
        for value in &values {
            info.add(*value);
        }
        match kind {
            AggregateKind::Count => {
                let counted = values
                    .iter()
                    .filter(|v| **v != FormulaValue::Bool(false))
                    .count();
                FormulaValue::Number(counted as f64)
            }
            AggregateKind::Any if values.is_empty() => FormulaValue::Null,
            AggregateKind::Any => values.iter().any(|v| v.is_truthy()).into(),
            AggregateKind::All if values.is_empty() => FormulaValue::Null,
            AggregateKind::All => values.iter().all(|v| v.is_truthy()).into(),
            AggregateKind::Avg => info.mean().into(),
            AggregateKind::Sum => info.sum().into(),
            AggregateKind::Min => info.min().into(),
            AggregateKind::Max => info.max().into(),
            AggregateKind::Median => info.median().into(),
            AggregateKind::Variance => info.variance().into(),
            AggregateKind::StdDev => info.std_dev().into(),
            AggregateKind::My => FormulaValue::Null,
        }
    }

    fn attribute(&self, attribute: Attribute, scope: &Scope<'_>) -> FormulaValue {
        let paper = scope.paper;
        match attribute {
            Attribute::PaperId => FormulaValue::Number(f64::from(paper.paper_id.0)),
            Attribute::Outcome => {
                if self
                    .oracle
                    .can_view_decision(&self.viewer, paper, scope.force)
                {
                    FormulaValue::Number(f64::from(paper.outcome))
                } else {
                    FormulaValue::Hidden
                }
            }
            _ if !attribute.view_score().visible_above(scope.bound) => FormulaValue::Hidden,
            Attribute::Conflict => {
                FormulaValue::Number(f64::from(paper.conflict_type(self.viewer.contact_id)))
            }
            Attribute::ReviewType => {
                let review_type = match scope.review {
                    Some(review) => review.review_type,
                    None => paper.review_type(self.viewer.contact_id),
                };
                FormulaValue::Number(f64::from(review_type))
            }
            Attribute::Preference => {
                let contact = scope
                    .review
                    .map_or(self.viewer.contact_id, |review| review.contact_id);
                FormulaValue::Number(f64::from(paper.preference(contact).value))
            }
            Attribute::TopicScore => {
                let contact = match scope.review {
                    Some(review) => self.settings.pc_member(review.contact_id),
                    None => Some(&self.viewer),
                };
                contact.map_or(FormulaValue::Null, |contact| {
                    FormulaValue::Number(f64::from(paper.topic_interest_score(contact)))
                })
            }
        }
    }

    fn tag(&self, tag: &str, scope: &Scope<'_>) -> FormulaValue {
        if !self
            .oracle
            .can_view_tags(&self.viewer, Some(scope.paper), scope.force)
        {
            return FormulaValue::Hidden;
        }
        let Some(canonical) = tags::canonical_tag(tag, self.viewer.contact_id) else {
            return FormulaValue::Null;
        };
        match scope.paper.tag_value(&canonical) {
            Some(0) => FormulaValue::Bool(true),
            Some(value) => FormulaValue::Number(value as f64),
            None => FormulaValue::Bool(false),
        }
    }

    fn score(&self, field_id: &str, view_score: ViewScore, scope: &Scope<'_>) -> FormulaValue {
        let Some(review) = scope.review else {
            return FormulaValue::Null;
        };
        let Some(score) = review.scores.get(field_id).copied().filter(|s| *s > 0) else {
            return FormulaValue::Null;
        };
        let visible = view_score.visible_above(scope.bound)
            && self
                .oracle
                .can_view_review(&self.viewer, scope.paper, review, scope.force);
        if visible {
            FormulaValue::Number(f64::from(score))
        } else {
            FormulaValue::Hidden
        }
    }
}

fn unary(op: Op, value: FormulaValue) -> FormulaValue {
    match (op, value) {
        (_, FormulaValue::Hidden) => FormulaValue::Hidden,
        (Op::Not, value) => FormulaValue::Bool(!value.is_truthy()),
        (_, value) => value.as_number().map(|n| -n).into(),
    }
}

fn binary(op: Op, left: FormulaValue, right: FormulaValue) -> FormulaValue {
    if left.is_hidden() || right.is_hidden() {
        return FormulaValue::Hidden;
    }
    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
        return FormulaValue::Null;
    };
    match op {
        Op::Plus => FormulaValue::Number(a + b),
        Op::Minus => FormulaValue::Number(a - b),
        Op::Star => FormulaValue::Number(a * b),
        Op::Slash | Op::Percent if b == 0.0 => FormulaValue::Null,
        Op::Slash => FormulaValue::Number(a / b),
        Op::Percent => FormulaValue::Number(a % b),
        Op::Eq => FormulaValue::Bool(a == b),
        Op::Ne => FormulaValue::Bool(a != b),
        Op::Lt => FormulaValue::Bool(a < b),
        Op::Le => FormulaValue::Bool(a <= b),
        Op::Gt => FormulaValue::Bool(a > b),
        Op::Ge => FormulaValue::Bool(a >= b),
        Op::And | Op::Or | Op::Not => FormulaValue::Null,
    }
}

fn call(function: ScalarFn, args: &[FormulaValue]) -> FormulaValue {
    if args.iter().any(|arg| arg.is_hidden()) {
        return FormulaValue::Hidden;
    }
    let first = args.first().and_then(|arg| arg.as_number());
    match function {
        ScalarFn::Round => {
            let digits = args.get(1).and_then(|arg| arg.as_number()).unwrap_or(0.0);
            let scale = 10f64.powi(digits as i32);
            first.map(|n| (n * scale).round() / scale).into()
        }
        ScalarFn::Floor => first.map(f64::floor).into(),
        ScalarFn::Ceil => first.map(f64::ceil).into(),
        ScalarFn::Abs => first.map(f64::abs).into(),
        ScalarFn::Greatest => args
            .iter()
            .filter_map(|arg| arg.as_number())
            .max_by(f64::total_cmp)
            .into(),
        ScalarFn::Least => args
            .iter()
            .filter_map(|arg| arg.as_number())
            .min_by(f64::total_cmp)
            .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_dominates_arithmetic() {
        assert_eq!(
            binary(Op::Plus, FormulaValue::Hidden, FormulaValue::Null),
            FormulaValue::Hidden
        );
        assert_eq!(
            binary(Op::Plus, FormulaValue::Number(1.0), FormulaValue::Null),
            FormulaValue::Null
        );
        assert_eq!(
            binary(Op::Slash, FormulaValue::Number(1.0), FormulaValue::Number(0.0)),
            FormulaValue::Null
        );
        assert_eq!(
            binary(Op::Gt, FormulaValue::Bool(true), FormulaValue::Number(0.5)),
            FormulaValue::Bool(true)
        );
    }

    #[test]
    fn scalar_functions_skip_nulls() {
        let args = [
            FormulaValue::Number(2.0),
            FormulaValue::Null,
            FormulaValue::Number(7.5),
        ];
        assert_eq!(call(ScalarFn::Greatest, &args), FormulaValue::Number(7.5));
        assert_eq!(call(ScalarFn::Least, &args), FormulaValue::Number(2.0));
        assert_eq!(
            call(
                ScalarFn::Round,
                &[FormulaValue::Number(2.346), FormulaValue::Number(1.0)]
            ),
            FormulaValue::Number(2.3)
        );
    }
}
