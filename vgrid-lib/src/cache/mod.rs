//! Sparse row cache
//!
//! Holds every row accepted from the data source, keyed by absolute row
//! index. There is no eviction: the cache is bounded by the total row count
//! and only grows as the user scrolls, until the next refresh clears it.

use std::collections::BTreeMap;

use crate::model::Row;
use crate::range::VisibleRange;

/// Sparse mapping from absolute row index to row data.
///
/// Gaps are normal: rows skipped during fast scrolling are never fetched. A
/// present entry is authoritative for its index until the cache is cleared
/// or a later accepted fetch overwrites it.
///
/// # Example
///
/// ```
/// use vgrid_lib::cache::RowCache;
/// use vgrid_lib::model::Row;
///
/// let mut cache = RowCache::new();
/// cache.merge(10, vec![Row::new().set("name", "a"), Row::new().set("name", "b")]);
///
/// assert!(cache.get(9).is_none());
/// assert_eq!(cache.get(11).and_then(|row| row.get_str("name")), Some("b"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RowCache {
    rows: BTreeMap<usize, Row>,
}

impl RowCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the row stored at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(&index)
    }

    /// Stores `items[i]` at `start_index + i`, overwriting existing entries.
    pub fn merge(&mut self, start_index: usize, items: Vec<Row>) {
        for (offset, row) in items.into_iter().enumerate() {
            self.rows.insert(start_index + offset, row);
        }
    }

    /// Drops every row at or beyond `total_count`.
    ///
    /// Returns the number of rows removed.
    pub fn truncate(&mut self, total_count: usize) -> usize {
        let removed = self.rows.split_off(&total_count);
        removed.len()
    }

    /// Removes every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Returns the number of cached rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no rows are cached.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates the cached rows inside `range`, in index order.
    pub fn iter_range(&self, range: VisibleRange) -> impl Iterator<Item = (usize, &Row)> {
        self.rows
            .range(range.indices())
            .map(|(index, row)| (*index, row))
    }
}
