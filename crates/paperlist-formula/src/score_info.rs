//! Running statistics over a sequence of numeric values.

use crate::value::FormulaValue;

/// Footer statistic selectable for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Count,
    Mean,
    Median,
    Total,
    Min,
    Max,
    StdDev,
    Variance,
}

impl Statistic {
    /// The statistics shown in a listing footer, in display order.
    pub const FOOTER: [Statistic; 7] = [
        Statistic::Count,
        Statistic::Mean,
        Statistic::Median,
        Statistic::Total,
        Statistic::Min,
        Statistic::Max,
        Statistic::StdDev,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Statistic::Count => "Count",
            Statistic::Mean => "Mean",
            Statistic::Median => "Median",
            Statistic::Total => "Total",
            Statistic::Min => "Min",
            Statistic::Max => "Max",
            Statistic::StdDev => "Standard deviation",
            Statistic::Variance => "Variance",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreInfo {
    values: Vec<f64>,
}

impl ScoreInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_scores(scores: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: scores.into_iter().map(f64::from).collect(),
        }
    }

    /// Adds a formula result. Null and hidden values are skipped.
    pub fn add(&mut self, value: FormulaValue) {
        if let Some(n) = value.as_number() {
            self.values.push(n);
        }
    }

    pub fn add_score(&mut self, score: f64) {
        self.values.push(score);
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn sum(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.values.iter().sum())
    }

    pub fn mean(&self) -> Option<f64> {
        self.sum().map(|sum| sum / self.values.len() as f64)
    }

    pub fn median(&self) -> Option<f64> {
        let sorted = self.sorted();
        let n = sorted.len();
        match n {
            0 => None,
            _ if n % 2 == 1 => Some(sorted[n / 2]),
            _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
        }
    }

    /// Population variance.
    pub fn variance(&self) -> Option<f64> {
        let mean = self.mean()?;
        let squares: f64 = self.values.iter().map(|v| (v - mean).powi(2)).sum();
        Some(squares / self.values.len() as f64)
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().min_by(f64::total_cmp)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().max_by(f64::total_cmp)
    }

    /// Count of each score from `max_score` down to 1, as fixed-width digits.
    ///
    /// Comparing these strings orders rows by their number of top scores,
    /// then by the next score down.
    pub fn counts_descending(&self, max_score: usize) -> String {
        (1..=max_score)
            .rev()
            .map(|score| {
                let count = self
                    .values
                    .iter()
                    .filter(|v| (**v - score as f64).abs() < f64::EPSILON)
                    .count();
                format!("{count:03}")
            })
            .collect()
    }

    pub fn statistic(&self, which: Statistic) -> FormulaValue {
        let value = match which {
            Statistic::Count => Some(self.count() as f64),
            Statistic::Mean => self.mean(),
            Statistic::Median => self.median(),
            Statistic::Total => self.sum(),
            Statistic::Min => self.min(),
            Statistic::Max => self.max(),
            Statistic::StdDev => self.std_dev(),
            Statistic::Variance => self.variance(),
        };
        value.into()
    }

    fn sorted(&self) -> Vec<f64> {
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_over_scores() {
        let info = ScoreInfo::from_scores([2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(info.mean(), Some(5.0));
        assert_eq!(info.median(), Some(4.5));
        assert_eq!(info.std_dev(), Some(2.0));
        assert_eq!(info.statistic(Statistic::Total), FormulaValue::Number(40.0));
        assert_eq!(info.statistic(Statistic::Min), FormulaValue::Number(2.0));
    }

    #[test]
    fn hidden_and_null_values_are_not_counted() {
        let mut info = ScoreInfo::new();
        info.add(FormulaValue::Number(3.0));
        info.add(FormulaValue::Hidden);
        info.add(FormulaValue::Null);
        info.add(FormulaValue::Bool(true));
        assert_eq!(info.count(), 2);
        assert_eq!(info.statistic(Statistic::Mean), FormulaValue::Number(2.0));
    }

    #[test]
    fn empty_statistics_are_null() {
        let info = ScoreInfo::new();
        assert_eq!(info.statistic(Statistic::Count), FormulaValue::Number(0.0));
        assert_eq!(info.statistic(Statistic::Median), FormulaValue::Null);
    }

    #[test]
    fn counts_descending_orders_by_top_scores() {
        let strong = ScoreInfo::from_scores([3, 3, 1]);
        let weak = ScoreInfo::from_scores([3, 2, 2, 2]);
        assert_eq!(strong.counts_descending(3), "002000001");
        assert!(strong.counts_descending(3) > weak.counts_descending(3));
    }
}
