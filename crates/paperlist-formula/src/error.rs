use thiserror::Error;

/// A formula that failed to parse or to resolve its references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("empty formula")]
    Empty,

    #[error("unexpected character `{ch}` at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    #[error("syntax error near `{near}`")]
    Syntax { near: String },

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },

    #[error("unknown identifier `{name}`")]
    UnknownIdentifier { name: String },

    #[error("review field `{name}` can only be used inside an aggregate function")]
    ScoreOutsideAggregate { name: String },

    #[error("`{name}` expects {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: &'static str,
        actual: usize,
    },

    #[error("invalid tag `{tag}`")]
    InvalidTag { tag: String },
}
