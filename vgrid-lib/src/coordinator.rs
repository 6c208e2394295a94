//! Request coordination
//!
//! Every fetch is stamped with a freshly minted [`RequestToken`]. Only the
//! response whose token is still the latest issued may touch the cache, so
//! a slow response to an old window can never overwrite rows fetched for a
//! newer one. In-flight requests are never cancelled; their results are
//! simply dropped when they arrive.

use std::fmt;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use log::debug;
use log::warn;

use crate::cache::RowCache;
use crate::error::GridError;
use crate::model::SortSpec;
use crate::range::VisibleRange;
use crate::source::DataSource;
use crate::source::FetchRequest;

/// Monotonically increasing identifier minted once per issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Returns the raw counter value.
    pub fn value(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happened to a fetch once it completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was authoritative and merged into the cache.
    Applied {
        /// Token of the applied request.
        token: RequestToken,
        /// Window that was requested.
        range: VisibleRange,
        /// Number of rows actually merged.
        rows: usize,
        /// Total count reported by the source.
        total_count: usize,
        /// Whether the total count differs from the previous one.
        total_changed: bool,
    },
    /// A newer request was issued while this one was in flight; the
    /// response (success or failure) was discarded.
    Stale {
        /// Token of the discarded request.
        token: RequestToken,
    },
    /// No fetch was needed (empty window or window already requested).
    Skipped,
    /// The grid was loading; the scroll position was recorded and will be
    /// reconciled once the load finishes.
    Deferred,
}

impl FetchOutcome {
    /// Returns `true` if the fetch mutated the cache.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Returns `true` if the response was discarded as superseded.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    /// Returns `true` if the response was applied and moved the total count.
    pub fn total_changed(&self) -> bool {
        matches!(
            self,
            Self::Applied {
                total_changed: true,
                ..
            }
        )
    }
}

/// State guarded together so the token check and the merge are atomic.
#[derive(Debug, Default)]
pub(crate) struct CoordinatorState {
    cache: RowCache,
    total_count: usize,
    latest: RequestToken,
}

/// Issues fetches against a [`DataSource`] and merges authoritative results.
///
/// Exclusively owns the row cache, the total count and the token counter.
/// Readers get short-lived read access through [`RequestCoordinator::read`].
pub struct RequestCoordinator<S: ?Sized> {
    source: Arc<S>,
    state: RwLock<CoordinatorState>,
}

impl<S: DataSource + ?Sized> RequestCoordinator<S> {
    /// Creates a coordinator over `source` with an empty cache.
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            state: RwLock::new(CoordinatorState::default()),
        }
    }

    /// Returns the data source.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Returns the most recently issued token.
    pub fn latest_token(&self) -> RequestToken {
        self.read_state().latest
    }

    /// Returns the total count from the most recent accepted fetch.
    pub fn total_count(&self) -> usize {
        self.read_state().total_count
    }

    /// Runs `f` with read access to the cache and total count.
    pub fn read<R>(&self, f: impl FnOnce(&RowCache, usize) -> R) -> R {
        let state = self.read_state();
        f(&state.cache, state.total_count)
    }

    /// Supersedes every in-flight request without touching the cache.
    pub fn supersede(&self) -> RequestToken {
        let mut state = self.write_state();
        state.latest = state.latest.next();
        state.latest
    }

    /// Supersedes every in-flight request and clears the cache.
    ///
    /// Both happen under one lock, so nothing issued before the call can
    /// repopulate the cleared cache.
    pub fn invalidate(&self) -> RequestToken {
        let mut state = self.write_state();
        state.latest = state.latest.next();
        state.cache.clear();
        debug!("Cache invalidated, latest token is now {}", state.latest);
        state.latest
    }

    /// Fetches `range` and merges the rows if no newer request was issued
    /// in the meantime.
    ///
    /// A failure of the authoritative request is returned as
    /// [`GridError::Fetch`] and leaves the cache unchanged. A superseded
    /// request always yields [`FetchOutcome::Stale`], even when it failed.
    pub async fn request(
        &self,
        range: VisibleRange,
        sort: &SortSpec,
        search_key: Option<&str>,
    ) -> Result<FetchOutcome, GridError> {
        let token = self.supersede();
        let request = FetchRequest {
            start_index: range.start(),
            limit: range.len(),
            sort_column: sort.column.clone(),
            sort_order: sort.order,
            search_key: search_key.map(str::to_owned),
            token,
        };
        debug!("Fetch {} issued for rows {}", token, range);

        let result = self.source.fetch(&request).await;

        let mut state = self.write_state();
        if state.latest != token {
            debug!(
                "Fetch {} for rows {} discarded, superseded by {}",
                token, range, state.latest
            );
            return Ok(FetchOutcome::Stale { token });
        }

        let mut result = match result {
            Ok(result) => result,
            Err(source) => {
                warn!("Fetch {} for rows {} failed: {}", token, range, source);
                return Err(GridError::Fetch { token, source });
            }
        };

        if result.items.len() > range.len() {
            warn!(
                "Fetch {} returned {} rows for a window of {}, ignoring the surplus",
                token,
                result.items.len(),
                range.len()
            );
            result.items.truncate(range.len());
        }

        let rows = result.items.len();
        let total_count = result.total_count;
        let total_changed = state.total_count != total_count;

        state.cache.merge(range.start(), result.items);
        if total_changed {
            let dropped = state.cache.truncate(total_count);
            if dropped > 0 {
                debug!("Dropped {} cached rows beyond total count {}", dropped, total_count);
            }
            state.total_count = total_count;
        }
        debug!(
            "Fetch {} applied {} rows at {} (total {})",
            token,
            rows,
            range.start(),
            total_count
        );

        Ok(FetchOutcome::Applied {
            token,
            range,
            rows,
            total_count,
            total_changed,
        })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CoordinatorState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CoordinatorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
