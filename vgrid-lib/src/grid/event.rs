//! Notifications broadcast to the host.

use super::Phase;
use crate::coordinator::RequestToken;
use crate::error::GridError;
use crate::range::VisibleRange;

/// Event emitted by a [`VirtualGrid`](crate::VirtualGrid).
///
/// Subscribe with [`VirtualGrid::subscribe`](crate::VirtualGrid::subscribe).
/// Fetch failures that happen on background scroll tasks are only reported
/// here and in the log.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// The lifecycle phase changed.
    PhaseChanged(Phase),
    /// An authoritative fetch was merged into the cache.
    RowsLoaded {
        /// Token of the applied request.
        token: RequestToken,
        /// Window that was requested.
        range: VisibleRange,
        /// Rows merged.
        rows: usize,
        /// Total count reported by the source.
        total_count: usize,
    },
    /// The authoritative fetch failed; cached rows were kept.
    FetchFailed {
        /// Window that was requested.
        range: VisibleRange,
        /// The failure.
        error: GridError,
    },
    /// The cache was cleared by a refresh, sort change or search change.
    CacheInvalidated,
}
