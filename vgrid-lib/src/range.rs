//! Scroll offset to row-index window math.
//!
//! All functions here are pure. Pixel quantities are `f64` because scroll
//! offsets reported by hosts are frequently fractional.
//!
//! Rounding: the first row is `floor(offset / row_height)` and the last edge
//! is `ceil((offset + viewport) / row_height)`, each widened by the buffer and
//! clamped to `[0, total_count - 1]`. With a 30px row, a 400px viewport, a
//! 10-row buffer and 500 rows, offset 0 yields rows `0..=24`.

use std::fmt;
use std::ops::RangeInclusive;

/// A non-empty, inclusive window of absolute row indices.
///
/// The "nothing to display" case is expressed as `Option<VisibleRange>::None`
/// so callers cannot issue a fetch for an empty window by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisibleRange {
    start: usize,
    end: usize,
}

impl VisibleRange {
    /// Creates a range covering `start..=end`.
    ///
    /// Returns `None` if `end < start`.
    pub fn new(start: usize, end: usize) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// First row index (inclusive).
    pub fn start(&self) -> usize {
        self.start
    }

    /// Last row index (inclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of rows in the window. Always at least 1.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always `false`; present for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if `index` lies inside the window.
    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }

    /// Returns `true` if `other` lies entirely inside this window.
    pub fn covers(&self, other: &VisibleRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Iterates the row indices of the window.
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

impl fmt::Display for VisibleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Maps a scroll position to the window of rows the renderer must display,
/// including `buffer_rows` extra rows on either side.
///
/// Returns `None` when there is nothing to display (`total_count == 0`) or
/// when `row_height` cannot drive the math. Negative or non-finite offsets
/// are treated as the top of the list. Offsets past the bottom of the
/// content (for example after the total count shrank) are clamped to the
/// last scroll position, so the window still covers a full viewport of the
/// last rows plus the buffer above them.
pub fn compute(
    scroll_offset: f64,
    viewport_height: f64,
    row_height: f64,
    buffer_rows: usize,
    total_count: usize,
) -> Option<VisibleRange> {
    if total_count == 0 || !row_height.is_finite() || row_height <= 0.0 {
        return None;
    }

    let viewport = sanitize(viewport_height);
    let max_offset = sanitize(total_count as f64 * row_height - viewport);
    let offset = sanitize(scroll_offset).min(max_offset);

    // `as` saturates for floats, so huge offsets cannot wrap.
    let first_visible = (offset / row_height).floor() as usize;
    let last_edge = ((offset + viewport) / row_height).ceil() as usize;

    let end = last_edge.saturating_add(buffer_rows).min(total_count - 1);
    let start = first_visible.saturating_sub(buffer_rows).min(end);

    VisibleRange::new(start, end)
}

/// The window fetched at mount time, before the total count is known:
/// one viewport of rows plus a buffer on both sides, starting at row 0.
pub fn initial(viewport_height: f64, row_height: f64, buffer_rows: usize) -> VisibleRange {
    let per_viewport = if row_height.is_finite() && row_height > 0.0 {
        (sanitize(viewport_height) / row_height).ceil() as usize
    } else {
        0
    };
    let rows = per_viewport
        .saturating_add(buffer_rows.saturating_mul(2))
        .max(1);

    VisibleRange {
        start: 0,
        end: rows - 1,
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
