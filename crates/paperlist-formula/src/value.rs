use std::cmp::Ordering;

/// Result of evaluating a formula on one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormulaValue {
    Null,
    Bool(bool),
    Number(f64),
    /// The viewer may not see some input of this value.
    Hidden,
}

impl FormulaValue {
    pub fn as_number(self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(n),
            FormulaValue::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            FormulaValue::Null | FormulaValue::Hidden => None,
        }
    }

    pub fn is_truthy(self) -> bool {
        match self {
            FormulaValue::Bool(b) => b,
            FormulaValue::Number(n) => n != 0.0,
            FormulaValue::Null | FormulaValue::Hidden => false,
        }
    }

    pub fn is_null(self) -> bool {
        matches!(self, FormulaValue::Null)
    }

    pub fn is_hidden(self) -> bool {
        matches!(self, FormulaValue::Hidden)
    }

    /// Orders values for sorting: null first, then by number.
    pub fn sort_cmp(self, other: Self) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.total_cmp(&b),
        }
    }
}

impl From<f64> for FormulaValue {
    fn from(value: f64) -> Self {
        FormulaValue::Number(value)
    }
}

impl From<bool> for FormulaValue {
    fn from(value: bool) -> Self {
        FormulaValue::Bool(value)
    }
}

impl From<Option<f64>> for FormulaValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(FormulaValue::Null, FormulaValue::Number)
    }
}

impl FormulaValue {
    /// Cell markup: a check mark for true, `?` for hidden.
    pub fn to_html(self) -> String {
        match self {
            FormulaValue::Null | FormulaValue::Bool(false) => String::new(),
            FormulaValue::Bool(true) => "&#x2713;".to_string(),
            FormulaValue::Number(n) => format_number(n),
            FormulaValue::Hidden => HIDDEN_SENTINEL.to_string(),
        }
    }

    pub fn to_text(self) -> String {
        match self {
            FormulaValue::Null | FormulaValue::Bool(false) => String::new(),
            FormulaValue::Bool(true) => "Y".to_string(),
            FormulaValue::Number(n) => format_number(n),
            FormulaValue::Hidden => HIDDEN_SENTINEL.to_string(),
        }
    }
}

/// Rendered in place of a value the viewer may not see.
pub const HIDDEN_SENTINEL: &str = "?";

/// Formats a number with at most two decimals, trailing zeros removed.
pub fn format_number(value: f64) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
