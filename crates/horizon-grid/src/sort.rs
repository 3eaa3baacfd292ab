//! Sort orders, backend sort clauses and in-memory comparison helpers.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::column::ColumnId;

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    /// Largest first.
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Apply the direction to an ascending ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }

    /// Parse the client's direction token (`asc` / `desc`).
    pub fn from_client(token: &str) -> Option<Self> {
        match token {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// One entry of the grid's sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSortOrder {
    /// The sorted column.
    pub column: ColumnId,
    /// Sort direction.
    pub direction: SortDirection,
}

impl GridSortOrder {
    /// Ascending order on a column.
    pub fn asc(column: ColumnId) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    /// Descending order on a column.
    pub fn desc(column: ColumnId) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

/// A backend sort clause produced by a column's sort-order provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySortOrder {
    /// Backend property name.
    pub property: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl QuerySortOrder {
    /// Create a clause.
    pub fn new(property: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }
}

/// Maps a sort direction to an ordered list of backend sort clauses.
pub type SortOrderProvider = Arc<dyn Fn(SortDirection) -> Vec<QuerySortOrder> + Send + Sync>;

/// Compares two items for in-memory sorting (ascending).
pub type ItemComparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A value extracted from an item for in-memory sorting.
///
/// Values of the same variant compare naturally. Integers and floats compare
/// numerically with each other. Any other mix falls back to comparing the
/// string renderings.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    /// Missing value; sorts before everything else.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for SortKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SortKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SortKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SortKey {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for SortKey {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<V: Into<SortKey>> From<Option<V>> for SortKey {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Ascending comparison of two sort keys.
pub fn compare_sort_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Null, SortKey::Null) => Ordering::Equal,
        (SortKey::Null, _) => Ordering::Less,
        (_, SortKey::Null) => Ordering::Greater,
        (SortKey::Bool(x), SortKey::Bool(y)) => x.cmp(y),
        (SortKey::Int(x), SortKey::Int(y)) => x.cmp(y),
        (SortKey::Float(x), SortKey::Float(y)) => x.total_cmp(y),
        (SortKey::Int(x), SortKey::Float(y)) => (*x as f64).total_cmp(y),
        (SortKey::Float(x), SortKey::Int(y)) => x.total_cmp(&(*y as f64)),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Chain comparators so later ones break ties of earlier ones.
pub fn chain_comparators<T: 'static>(comparators: Vec<ItemComparator<T>>) -> ItemComparator<T> {
    Arc::new(move |a: &T, b: &T| {
        comparators
            .iter()
            .map(|cmp| cmp(a, b))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_type_comparison() {
        assert_eq!(compare_sort_keys(&SortKey::Int(1), &SortKey::Int(2)), Ordering::Less);
        assert_eq!(
            compare_sort_keys(&"b".into(), &"a".into()),
            Ordering::Greater
        );
    }

    #[test]
    fn test_numeric_mix_compares_numerically() {
        assert_eq!(
            compare_sort_keys(&SortKey::Int(10), &SortKey::Float(9.5)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_mixed_types_fall_back_to_strings() {
        // "10" < "9" as strings
        assert_eq!(
            compare_sort_keys(&SortKey::Int(10), &SortKey::Text("9".into())),
            Ordering::Less
        );
        assert_eq!(
            compare_sort_keys(&SortKey::Bool(true), &SortKey::Text("apple".into())),
            Ordering::Greater
        );
    }

    #[test]
    fn test_null_sorts_first() {
        assert_eq!(compare_sort_keys(&SortKey::Null, &SortKey::Int(0)), Ordering::Less);
        assert_eq!(SortKey::from(None::<i64>), SortKey::Null);
    }

    #[test]
    fn test_chain_comparators() {
        let by_len: ItemComparator<&str> = Arc::new(|a: &&str, b: &&str| a.len().cmp(&b.len()));
        let alpha: ItemComparator<&str> = Arc::new(|a: &&str, b: &&str| a.cmp(b));
        let chained = chain_comparators(vec![by_len, alpha]);

        let mut words = vec!["pear", "fig", "apple", "kiwi"];
        words.sort_by(|a, b| chained(a, b));
        assert_eq!(words, vec!["fig", "kiwi", "pear", "apple"]);
    }

    #[test]
    fn test_direction_tokens() {
        assert_eq!(SortDirection::from_client("desc"), Some(SortDirection::Descending));
        assert_eq!(SortDirection::from_client("sideways"), None);
        assert_eq!(SortDirection::Ascending.reversed(), SortDirection::Descending);
        assert_eq!(
            SortDirection::Descending.apply(Ordering::Less),
            Ordering::Greater
        );
    }
}
