//! Read-only view handed to renderers.

use super::Phase;
use crate::cache::RowCache;
use crate::model::Row;
use crate::range::VisibleRange;

/// Content of one displayed row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowSlot {
    /// The row has been fetched.
    Loaded(Row),
    /// The row is not cached yet; render a placeholder.
    Placeholder,
}

impl RowSlot {
    /// Returns the row if loaded.
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Self::Loaded(row) => Some(row),
            Self::Placeholder => None,
        }
    }

    /// Returns `true` if the row has been fetched.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Point-in-time copy of everything a renderer needs.
///
/// Holds one slot per index of the visible range, so its size is bounded by
/// the viewport, not by the data set.
#[derive(Debug, Clone)]
pub struct GridSnapshot {
    phase: Phase,
    visible: Option<VisibleRange>,
    total_count: usize,
    row_height: f64,
    cached_rows: usize,
    rows: Vec<(usize, RowSlot)>,
}

impl GridSnapshot {
    pub(crate) fn capture(
        phase: Phase,
        visible: Option<VisibleRange>,
        row_height: f64,
        cache: &RowCache,
        total_count: usize,
    ) -> Self {
        let rows = visible
            .map(|range| {
                let mut cached = cache.iter_range(range).peekable();
                range
                    .indices()
                    .map(|index| {
                        let slot = match cached.next_if(|(at, _)| *at == index) {
                            Some((_, row)) => RowSlot::Loaded(row.clone()),
                            None => RowSlot::Placeholder,
                        };
                        (index, slot)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            phase,
            visible,
            total_count,
            row_height,
            cached_rows: cache.len(),
            rows,
        }
    }

    /// Lifecycle phase at capture time.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Window being displayed, `None` when there is nothing to display.
    pub fn visible_range(&self) -> Option<VisibleRange> {
        self.visible
    }

    /// Total count from the last accepted fetch.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Number of rows held in the cache, visible or not.
    pub fn cached_rows(&self) -> usize {
        self.cached_rows
    }

    /// Slots of the visible window, in index order.
    pub fn rows(&self) -> &[(usize, RowSlot)] {
        &self.rows
    }

    /// Slot for an absolute index, if it is inside the visible window.
    pub fn row(&self, index: usize) -> Option<&RowSlot> {
        let visible = self.visible.filter(|range| range.contains(index))?;
        self.rows
            .get(index - visible.start())
            .map(|(_, slot)| slot)
    }

    /// Number of visible rows already fetched.
    pub fn loaded_count(&self) -> usize {
        self.rows.iter().filter(|(_, slot)| slot.is_loaded()).count()
    }

    /// Number of visible rows still showing a placeholder.
    pub fn placeholder_count(&self) -> usize {
        self.rows.len() - self.loaded_count()
    }

    /// Returns `true` while the whole table should show a loading indicator.
    pub fn is_blocking(&self) -> bool {
        self.phase.is_blocking()
    }

    /// Returns `true` when loaded and there are no rows to show.
    pub fn is_empty(&self) -> bool {
        !self.is_blocking() && self.visible.is_none()
    }

    /// Height of the full virtual content in pixels.
    pub fn content_height(&self) -> f64 {
        self.total_count as f64 * self.row_height
    }

    /// Pixel offset of the top edge of row `index`.
    pub fn row_top(&self, index: usize) -> f64 {
        index as f64 * self.row_height
    }
}
