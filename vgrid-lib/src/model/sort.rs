//! Sort specification forwarded to data sources.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Sort direction requested from the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9).
    #[serde(alias = "asc", alias = "ASC")]
    Ascending,
    /// Descending order (Z-A, 9-0).
    #[serde(alias = "desc", alias = "DESC")]
    Descending,
    /// Whatever order the source returns natively.
    #[default]
    #[serde(alias = "none")]
    Unspecified,
}

impl SortOrder {
    /// Returns the wire keyword for this order (`ASC`/`DESC`), or `None` when unspecified.
    pub fn as_keyword(&self) -> Option<&'static str> {
        match self {
            Self::Ascending => Some("ASC"),
            Self::Descending => Some("DESC"),
            Self::Unspecified => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_keyword().unwrap_or("NONE"))
    }
}

/// Error returned when parsing an unknown sort order keyword.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sort order: {0}")]
pub struct ParseSortOrderError(String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            "" | "none" | "unspecified" => Ok(Self::Unspecified),
            _ => Err(ParseSortOrderError(s.to_string())),
        }
    }
}

/// Column and direction the rows are ordered by.
///
/// Row identity is positional, so any change to the sort spec invalidates
/// every cached row.
///
/// # Example
///
/// ```
/// use vgrid_lib::model::{SortOrder, SortSpec};
///
/// let sort = SortSpec::desc("name");
/// assert_eq!(sort.order, SortOrder::Descending);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSpec {
    /// Column (data key) to sort by. Empty means no column.
    pub column: String,
    /// Sort direction.
    pub order: SortOrder,
}

impl SortSpec {
    /// Creates a sort spec.
    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }

    /// Creates an ascending sort on a column.
    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, SortOrder::Ascending)
    }

    /// Creates a descending sort on a column.
    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, SortOrder::Descending)
    }

    /// Returns `true` if rows should come back in source order.
    pub fn is_unsorted(&self) -> bool {
        self.column.is_empty() || self.order == SortOrder::Unspecified
    }
}
