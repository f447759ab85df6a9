//! Sort keys, sorter specifications and the per-listing key table.

use std::cmp::Ordering;
use std::collections::HashMap;

use paperlist_model::PaperId;

/// A value a column sorts by.
///
/// Keys form a total order: null first, then numbers (integers and floats
/// compare numerically), then text, then lists compared element by element.
#[derive(Debug, Clone)]
pub enum SortKey {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<SortKey>),
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Int(_) | SortKey::Float(_) => 1,
            SortKey::Text(_) => 2,
            SortKey::List(_) => 3,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Int(a), SortKey::Int(b)) => a.cmp(b),
            (SortKey::Float(a), SortKey::Float(b)) => a.total_cmp(b),
            (SortKey::Int(a), SortKey::Float(b)) => (*a as f64).total_cmp(b),
            (SortKey::Float(a), SortKey::Int(b)) => a.total_cmp(&(*b as f64)),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::List(a), SortKey::List(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

/// How a score column orders rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScoreSortMethod {
    /// Most top scores first, then the next score down.
    #[default]
    Counts,
    Average,
    Median,
    Variance,
    /// Spread between the highest and lowest score.
    MaxMinDiff,
    /// The reviewer of interest's own score.
    MyScore,
}

impl ScoreSortMethod {
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "c" | "count" | "counts" => Some(Self::Counts),
            "a" | "av" | "avg" | "average" => Some(Self::Average),
            "e" | "med" | "median" => Some(Self::Median),
            "v" | "var" | "variance" => Some(Self::Variance),
            "d" | "maxmin" | "range" => Some(Self::MaxMinDiff),
            "y" | "my" | "myscore" => Some(Self::MyScore),
            _ => None,
        }
    }
}

/// Identifies one sorter within a listing; keys are stored per handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SorterHandle(pub u32);

/// A requested ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sorter {
    pub handle: SorterHandle,
    /// Column name as requested.
    pub column: String,
    pub reverse: bool,
    pub score_method: ScoreSortMethod,
}

/// A parsed sort request such as `-title` or `OveMer:avg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub reverse: bool,
    pub score_method: ScoreSortMethod,
}

impl SortSpec {
    /// Parses `[-]name[:method]`.
    ///
    /// A suffix that is not a score method stays part of the name, so
    /// `tag:accept` still names the tag column.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (reverse, rest) = match text.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        if rest.is_empty() {
            return None;
        }
        let (column, score_method) = match rest.rsplit_once(':') {
            Some((column, method)) if !column.is_empty() => match ScoreSortMethod::parse(method) {
                Some(method) => (column, method),
                None => (rest, ScoreSortMethod::default()),
            },
            _ => (rest, ScoreSortMethod::default()),
        };
        Some(Self {
            column: column.to_string(),
            reverse,
            score_method,
        })
    }
}

/// Sort keys computed for one listing, by sorter and submission.
#[derive(Debug, Default)]
pub struct SortKeyTable {
    keys: HashMap<SorterHandle, HashMap<PaperId, SortKey>>,
}

impl SortKeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: SorterHandle, paper: PaperId, key: SortKey) {
        self.keys.entry(handle).or_default().insert(paper, key);
    }

    /// The stored key, or [`SortKey::Null`] when none was computed.
    pub fn get(&self, handle: SorterHandle, paper: PaperId) -> &SortKey {
        self.keys
            .get(&handle)
            .and_then(|keys| keys.get(&paper))
            .unwrap_or(&SortKey::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_reverse_and_score_method() {
        let spec = SortSpec::parse("-OveMer:avg").expect("spec");
        assert_eq!(spec.column, "OveMer");
        assert!(spec.reverse);
        assert_eq!(spec.score_method, ScoreSortMethod::Average);

        let spec = SortSpec::parse("tag:accept").expect("spec");
        assert_eq!(spec.column, "tag:accept");
        assert!(!spec.reverse);
        assert_eq!(spec.score_method, ScoreSortMethod::Counts);

        assert!(SortSpec::parse("-").is_none());
    }

    #[test]
    fn mixed_keys_have_a_fixed_order() {
        let mut keys = vec![
            SortKey::Text("b".into()),
            SortKey::Float(2.5),
            SortKey::Null,
            SortKey::Int(3),
            SortKey::Int(-1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                SortKey::Null,
                SortKey::Int(-1),
                SortKey::Float(2.5),
                SortKey::Int(3),
                SortKey::Text("b".into()),
            ]
        );
        assert_eq!(SortKey::Int(2), SortKey::Float(2.0));
    }

    #[test]
    fn missing_keys_read_as_null() {
        let mut table = SortKeyTable::new();
        table.insert(SorterHandle(1), PaperId(4), SortKey::Int(9));
        assert_eq!(table.get(SorterHandle(1), PaperId(4)), &SortKey::Int(9));
        assert_eq!(table.get(SorterHandle(2), PaperId(4)), &SortKey::Null);
    }

    fn key() -> impl Strategy<Value = SortKey> {
        prop_oneof![
            Just(SortKey::Null),
            (-5i64..5).prop_map(SortKey::Int),
            (-5i32..5).prop_map(|n| SortKey::Float(f64::from(n) / 2.0)),
            "[a-c]{0,2}".prop_map(SortKey::Text),
        ]
    }

    proptest! {
        #[test]
        fn ordering_is_antisymmetric_and_transitive(a in key(), b in key(), c in key()) {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            if a <= b && b <= c {
                prop_assert!(a <= c);
            }
        }
    }
}
