//! Grid lifecycle phases.

use std::fmt;

/// Why the grid is loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadKind {
    /// First load after mount. Blocks the whole table.
    Initial,
    /// Reload after an explicit refresh, sort change or search change.
    Refresh,
}

/// Lifecycle phase of a [`VirtualGrid`](crate::VirtualGrid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Built but not mounted yet.
    #[default]
    Uninitialized,
    /// A load is in flight.
    Loading(LoadKind),
    /// Idle; scroll changes fetch their window directly.
    Ready,
    /// Torn down. No further work is accepted.
    Unmounted,
}

impl Phase {
    /// Returns `true` while any load is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }

    /// Returns `true` if the renderer should hide the whole table behind a
    /// loading indicator.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Loading(LoadKind::Initial))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("uninitialized"),
            Self::Loading(LoadKind::Initial) => f.write_str("loading (initial)"),
            Self::Loading(LoadKind::Refresh) => f.write_str("loading (refresh)"),
            Self::Ready => f.write_str("ready"),
            Self::Unmounted => f.write_str("unmounted"),
        }
    }
}
