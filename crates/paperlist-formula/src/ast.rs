//! Checked formula expression tree.

use paperlist_model::ViewScore;

use crate::lexer::Op;
use crate::value::FormulaValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Avg,
    Sum,
    Min,
    Max,
    Count,
    Median,
    Variance,
    StdDev,
    Any,
    All,
    /// Value on the viewer's own review.
    My,
}

impl AggregateKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "avg" | "mean" => AggregateKind::Avg,
            "sum" => AggregateKind::Sum,
            "min" => AggregateKind::Min,
            "max" => AggregateKind::Max,
            "count" => AggregateKind::Count,
            "median" => AggregateKind::Median,
            "var" | "variance" | "var_pop" => AggregateKind::Variance,
            "std" | "stddev" | "stddev_pop" => AggregateKind::StdDev,
            "any" => AggregateKind::Any,
            "all" => AggregateKind::All,
            "my" => AggregateKind::My,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            AggregateKind::Avg => "avg",
            AggregateKind::Sum => "sum",
            AggregateKind::Min => "min",
            AggregateKind::Max => "max",
            AggregateKind::Count => "count",
            AggregateKind::Median => "median",
            AggregateKind::Variance => "variance",
            AggregateKind::StdDev => "stddev",
            AggregateKind::Any => "any",
            AggregateKind::All => "all",
            AggregateKind::My => "my",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFn {
    Round,
    Floor,
    Ceil,
    Abs,
    Greatest,
    Least,
}

impl ScalarFn {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "round" => ScalarFn::Round,
            "floor" => ScalarFn::Floor,
            "ceil" | "ceiling" => ScalarFn::Ceil,
            "abs" => ScalarFn::Abs,
            "greatest" => ScalarFn::Greatest,
            "least" => ScalarFn::Least,
            _ => return None,
        })
    }

    /// Accepted argument counts as (min, max, description).
    pub fn arity(self) -> (usize, usize, &'static str) {
        match self {
            ScalarFn::Round => (1, 2, "1 or 2"),
            ScalarFn::Floor | ScalarFn::Ceil | ScalarFn::Abs => (1, 1, "1"),
            ScalarFn::Greatest | ScalarFn::Least => (1, usize::MAX, "at least 1"),
        }
    }
}

/// Row attributes a formula may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    PaperId,
    Outcome,
    /// The viewer's conflict type.
    Conflict,
    /// Topic interest of the viewer, or of the reviewer inside an aggregate.
    TopicScore,
    /// Review type of the viewer, or of the current review inside an aggregate.
    ReviewType,
    /// Preference of the viewer, or of the current reviewer inside an aggregate.
    Preference,
}

impl Attribute {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "pid" | "id" => Attribute::PaperId,
            "outcome" | "dec" | "decision" => Attribute::Outcome,
            "conflict" => Attribute::Conflict,
            "topicscore" | "topic_score" => Attribute::TopicScore,
            "revtype" | "reviewtype" => Attribute::ReviewType,
            "pref" | "revpref" | "preference" => Attribute::Preference,
            _ => return None,
        })
    }

    /// Least privileged audience that may read the attribute.
    pub fn view_score(self) -> ViewScore {
        match self {
            Attribute::PaperId | Attribute::Outcome => ViewScore::AUTHOR,
            Attribute::Conflict
            | Attribute::TopicScore
            | Attribute::ReviewType
            | Attribute::Preference => ViewScore::PC,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(FormulaValue),
    Unary(Op, Box<Expr>),
    Binary(Op, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(ScalarFn, Vec<Expr>),
    Aggregate(AggregateKind, Box<Expr>),
    Attribute(Attribute),
    /// Tag as written, canonicalized per viewer at evaluation.
    Tag(String),
    /// Review field score; only valid inside an aggregate.
    Score {
        field_id: String,
        view_score: ViewScore,
    },
}
