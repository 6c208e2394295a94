//! Lifecycle controller
//!
//! [`VirtualGrid`] ties the pieces together: it turns settled scroll offsets
//! into windows, decides when a window must be fetched, and owns the
//! mount/refresh/unmount lifecycle.
//!
//! ```text
//! Uninitialized ──mount──▶ Loading(Initial) ──▶ Ready ──refresh──▶ Loading(Refresh) ──▶ Ready
//! ```

mod event;
mod snapshot;
mod state;

pub use event::GridEvent;
pub use snapshot::GridSnapshot;
pub use snapshot::RowSlot;
pub use state::LoadKind;
pub use state::Phase;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use log::debug;
use log::info;
use tokio::sync::broadcast;

use crate::config::GridConfig;
use crate::coordinator::FetchOutcome;
use crate::coordinator::RequestCoordinator;
use crate::coordinator::RequestToken;
use crate::debounce::ScrollDebouncer;
use crate::error::ConfigError;
use crate::error::GridError;
use crate::model::Row;
use crate::model::SortSpec;
use crate::range::VisibleRange;
use crate::source::DataSource;

const EVENT_CAPACITY: usize = 64;
/// Upper bound on follow-up fetches while the total count keeps moving.
const MAX_RECONCILE_FETCHES: usize = 3;

#[derive(Debug)]
struct GridInner {
    phase: Phase,
    sort: SortSpec,
    search_key: Option<String>,
    scroll_offset: f64,
    /// A scroll settled while loading and still has to be reconciled.
    scroll_dirty: bool,
    last_requested: Option<VisibleRange>,
    /// Bumped per load so an overtaken load does not flip the phase to Ready.
    load_seq: u64,
}

/// A windowed view over a paginated [`DataSource`].
///
/// Only the rows of the visible window (plus a buffer) are ever requested.
/// Responses are reconciled through a [`RequestCoordinator`], so when
/// several fetches overlap only the most recently issued one can change the
/// cache.
///
/// Mounting needs an `Arc` because the grid spawns a scroll listener that
/// holds a weak reference back to it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use vgrid_lib::GridConfig;
/// use vgrid_lib::VirtualGrid;
/// use vgrid_lib::model::Row;
/// use vgrid_lib::source::InMemorySource;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let rows = (0..1000).map(|i| Row::new().set("id", i)).collect();
/// let source = Arc::new(InMemorySource::new(rows));
/// let grid = Arc::new(VirtualGrid::new(source, GridConfig::default())?);
///
/// grid.mount().await?;
/// grid.apply_scroll(3000.0).await?; // a settled scroll offset
/// grid.refresh().await?;            // e.g. after deleting a row
///
/// let snapshot = grid.snapshot();
/// assert_eq!(snapshot.total_count(), 1000);
/// assert_eq!(snapshot.placeholder_count(), 0);
///
/// grid.unmount();
/// # Ok(())
/// # }
/// ```
pub struct VirtualGrid<S: ?Sized> {
    config: GridConfig,
    coordinator: RequestCoordinator<S>,
    inner: RwLock<GridInner>,
    scroll: Mutex<Option<ScrollDebouncer>>,
    events: broadcast::Sender<GridEvent>,
}

impl<S: DataSource + ?Sized + 'static> VirtualGrid<S> {
    /// Creates an unmounted grid.
    ///
    /// Fails if the configuration cannot drive the index/pixel math.
    pub fn new(source: Arc<S>, config: GridConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            inner: RwLock::new(GridInner {
                phase: Phase::Uninitialized,
                sort: config.initial_sort.clone(),
                search_key: None,
                scroll_offset: 0.0,
                scroll_dirty: false,
                last_requested: None,
                load_seq: 0,
            }),
            coordinator: RequestCoordinator::new(source),
            scroll: Mutex::new(None),
            events,
            config,
        })
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Starts the scroll listener and performs the initial load.
    ///
    /// The initial window is one viewport of rows plus a buffer on both
    /// sides, from row 0. The grid becomes [`Phase::Ready`] once the load
    /// completes, whether or not it succeeded.
    pub async fn mount(self: &Arc<Self>) -> Result<FetchOutcome, GridError> {
        let seq = {
            let mut inner = self.write_inner();
            match inner.phase {
                Phase::Uninitialized => {}
                Phase::Unmounted => return Err(GridError::Unmounted),
                _ => return Err(GridError::AlreadyMounted),
            }
            inner.load_seq += 1;
            inner.phase = Phase::Loading(LoadKind::Initial);
            inner.load_seq
        };
        self.emit(GridEvent::PhaseChanged(Phase::Loading(LoadKind::Initial)));
        self.start_scroll_listener();

        let range = self.config.initial_range();
        info!("Grid mounted, loading rows {}", range);

        let outcome = self.fetch(range).await;
        let total_changed = outcome.as_ref().is_ok_and(FetchOutcome::total_changed);
        self.finish_loading(seq, total_changed).await;
        outcome
    }

    /// Clears the cache and refetches the current window.
    ///
    /// The window is the one at the current scroll position, not the top of
    /// the list. If nothing is displayable (the last total count was 0) the
    /// initial window is fetched instead so the total count is re-queried.
    /// Responses to requests issued before the call are discarded.
    pub async fn refresh(&self) -> Result<FetchOutcome, GridError> {
        let seq = self.begin_refresh()?;
        self.reload(seq).await
    }

    /// Changes the sort and refreshes. A no-op if the sort is unchanged.
    ///
    /// Before mount this only replaces the sort used by the initial load.
    pub async fn set_sort(&self, sort: SortSpec) -> Result<FetchOutcome, GridError> {
        {
            let mut inner = self.write_inner();
            if inner.phase == Phase::Unmounted {
                return Err(GridError::Unmounted);
            }
            if inner.sort == sort {
                return Ok(FetchOutcome::Skipped);
            }
            debug!("Sort changed to {} {}", sort.column, sort.order);
            inner.sort = sort;
            if inner.phase == Phase::Uninitialized {
                return Ok(FetchOutcome::Skipped);
            }
        }
        self.refresh().await
    }

    /// Changes the search key and refreshes. A no-op if unchanged.
    ///
    /// An empty key clears the search.
    pub async fn set_search_key(&self, key: Option<String>) -> Result<FetchOutcome, GridError> {
        let key = key.filter(|key| !key.is_empty());
        {
            let mut inner = self.write_inner();
            if inner.phase == Phase::Unmounted {
                return Err(GridError::Unmounted);
            }
            if inner.search_key == key {
                return Ok(FetchOutcome::Skipped);
            }
            debug!("Search key changed to {:?}", key);
            inner.search_key = key;
            if inner.phase == Phase::Uninitialized {
                return Ok(FetchOutcome::Skipped);
            }
        }
        self.refresh().await
    }

    /// Stops the scroll listener, cancels any pending debounce timer and
    /// discards every in-flight response.
    pub fn unmount(&self) {
        {
            let mut inner = self.write_inner();
            if inner.phase == Phase::Unmounted {
                return;
            }
            inner.phase = Phase::Unmounted;
            inner.scroll_dirty = false;
        }
        if let Some(mut debouncer) = self.lock_scroll().take() {
            debouncer.shutdown();
        }
        self.coordinator.supersede();
        info!("Grid unmounted");
        self.emit(GridEvent::PhaseChanged(Phase::Unmounted));
    }

    // -------------------------------------------------------------------------
    // Scrolling
    // -------------------------------------------------------------------------

    /// Feeds a raw scroll event. The window is recomputed once scrolling has
    /// been quiet for the configured debounce interval.
    pub fn scroll(&self, offset: f64) -> Result<(), GridError> {
        match self.phase() {
            Phase::Uninitialized => return Err(GridError::NotMounted),
            Phase::Unmounted => return Err(GridError::Unmounted),
            _ => {}
        }
        match self.lock_scroll().as_ref() {
            Some(debouncer) if debouncer.push(offset) => Ok(()),
            _ => Err(GridError::Unmounted),
        }
    }

    /// Applies a settled scroll offset.
    ///
    /// While ready, fetches the window at `offset` if it differs from the
    /// last requested one. While loading, records the offset and returns
    /// [`FetchOutcome::Deferred`]; the window is fetched when the load ends.
    ///
    /// If the response changes the total count, the window at `offset` is
    /// recomputed against the new total and fetched too when it moved.
    pub async fn apply_scroll(&self, offset: f64) -> Result<FetchOutcome, GridError> {
        let range = {
            let mut inner = self.write_inner();
            match inner.phase {
                Phase::Uninitialized => return Err(GridError::NotMounted),
                Phase::Unmounted => return Err(GridError::Unmounted),
                Phase::Loading(_) => {
                    inner.scroll_offset = offset;
                    inner.scroll_dirty = true;
                    debug!("Scroll to {} deferred until the load completes", offset);
                    return Ok(FetchOutcome::Deferred);
                }
                Phase::Ready => {}
            }
            inner.scroll_offset = offset;

            let total = self.coordinator.total_count();
            match self.config.range_at(offset, total) {
                None => {
                    debug!("Scroll to {} shows no rows (total {})", offset, total);
                    return Ok(FetchOutcome::Skipped);
                }
                Some(range) if inner.last_requested == Some(range) => {
                    return Ok(FetchOutcome::Skipped);
                }
                Some(range) => range,
            }
        };

        let outcome = self.fetch(range).await;
        if outcome.as_ref().is_ok_and(FetchOutcome::total_changed) {
            self.reconcile().await;
        }
        outcome
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    /// Captures what the renderer should display right now.
    pub fn snapshot(&self) -> GridSnapshot {
        let inner = self.read_inner();
        self.coordinator.read(|cache, total| {
            let visible = self.config.range_at(inner.scroll_offset, total);
            GridSnapshot::capture(inner.phase, visible, self.config.row_height, cache, total)
        })
    }

    /// Subscribes to grid events.
    pub fn subscribe(&self) -> broadcast::Receiver<GridEvent> {
        self.events.subscribe()
    }

    /// Returns the current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.read_inner().phase
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Returns the data source.
    pub fn source(&self) -> &Arc<S> {
        self.coordinator.source()
    }

    /// Returns the current sort.
    pub fn sort(&self) -> SortSpec {
        self.read_inner().sort.clone()
    }

    /// Returns the current search key.
    pub fn search_key(&self) -> Option<String> {
        self.read_inner().search_key.clone()
    }

    /// Returns the last settled scroll offset.
    pub fn scroll_offset(&self) -> f64 {
        self.read_inner().scroll_offset
    }

    /// Returns the total count from the most recent accepted fetch.
    pub fn total_count(&self) -> usize {
        self.coordinator.total_count()
    }

    /// Returns the window displayed at the current scroll offset.
    pub fn visible_range(&self) -> Option<VisibleRange> {
        let offset = self.read_inner().scroll_offset;
        self.config.range_at(offset, self.coordinator.total_count())
    }

    /// Returns the window most recently requested from the source.
    pub fn last_requested(&self) -> Option<VisibleRange> {
        self.read_inner().last_requested
    }

    /// Returns a copy of the cached row at `index`.
    pub fn cached_row(&self, index: usize) -> Option<Row> {
        self.coordinator.read(|cache, _| cache.get(index).cloned())
    }

    /// Returns the number of cached rows.
    pub fn cached_len(&self) -> usize {
        self.coordinator.read(|cache, _| cache.len())
    }

    /// Returns the most recently issued request token.
    pub fn latest_token(&self) -> RequestToken {
        self.coordinator.latest_token()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn start_scroll_listener(self: &Arc<Self>) {
        let (debouncer, mut settled) = ScrollDebouncer::spawn(self.config.debounce_interval);
        *self.lock_scroll() = Some(debouncer);

        let grid = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(offset) = settled.recv().await {
                let Some(grid) = grid.upgrade() else {
                    break;
                };
                // Each window gets its own task so fetches overlap; the
                // coordinator sorts out which response wins.
                tokio::spawn(async move {
                    if let Err(err) = grid.apply_scroll(offset).await {
                        debug!("Scroll to {} not applied: {}", offset, err);
                    }
                });
            }
        });
    }

    fn begin_refresh(&self) -> Result<u64, GridError> {
        let mut inner = self.write_inner();
        match inner.phase {
            Phase::Uninitialized => return Err(GridError::NotMounted),
            Phase::Unmounted => return Err(GridError::Unmounted),
            _ => {}
        }
        inner.load_seq += 1;
        inner.phase = Phase::Loading(LoadKind::Refresh);
        inner.last_requested = None;
        self.coordinator.invalidate();
        Ok(inner.load_seq)
    }

    async fn reload(&self, seq: u64) -> Result<FetchOutcome, GridError> {
        self.emit(GridEvent::CacheInvalidated);
        self.emit(GridEvent::PhaseChanged(Phase::Loading(LoadKind::Refresh)));

        let range = self
            .visible_range()
            .unwrap_or_else(|| self.config.initial_range());
        info!("Refreshing rows {}", range);

        let outcome = self.fetch(range).await;
        let total_changed = outcome.as_ref().is_ok_and(FetchOutcome::total_changed);
        self.finish_loading(seq, total_changed).await;
        outcome
    }

    async fn fetch(&self, range: VisibleRange) -> Result<FetchOutcome, GridError> {
        let (sort, search_key) = {
            let mut inner = self.write_inner();
            inner.last_requested = Some(range);
            (inner.sort.clone(), inner.search_key.clone())
        };

        let outcome = self
            .coordinator
            .request(range, &sort, search_key.as_deref())
            .await;

        match &outcome {
            Ok(FetchOutcome::Applied {
                token,
                rows,
                total_count,
                ..
            }) => self.emit(GridEvent::RowsLoaded {
                token: *token,
                range,
                rows: *rows,
                total_count: *total_count,
            }),
            Ok(_) => {}
            Err(error) => {
                {
                    let mut inner = self.write_inner();
                    // Let the same window be retried by the next scroll.
                    if inner.last_requested == Some(range) {
                        inner.last_requested = None;
                    }
                }
                self.emit(GridEvent::FetchFailed {
                    range,
                    error: error.clone(),
                });
            }
        }
        outcome
    }

    async fn finish_loading(&self, seq: u64, total_changed: bool) {
        let reconcile = {
            let mut inner = self.write_inner();
            if inner.load_seq != seq || !inner.phase.is_loading() {
                return;
            }
            inner.phase = Phase::Ready;
            std::mem::take(&mut inner.scroll_dirty) || total_changed
        };
        self.emit(GridEvent::PhaseChanged(Phase::Ready));

        if reconcile {
            self.reconcile().await;
        }
    }

    /// Fetches the window at the current scroll offset until the last
    /// requested window covers it.
    ///
    /// Needed after a scroll settled during a load, and after a response
    /// changed the total count: a shrunk total can leave the offset past the
    /// end of the content, and the window it maps to is then no longer the
    /// one that was fetched.
    async fn reconcile(&self) {
        for _ in 0..MAX_RECONCILE_FETCHES {
            let Some(range) = self.pending_window() else {
                return;
            };
            debug!("Fetching rows {} to match the scroll position", range);
            match self.fetch(range).await {
                Ok(outcome) if outcome.total_changed() => {}
                Ok(_) => return,
                Err(err) => {
                    debug!("Reconciling fetch failed: {}", err);
                    return;
                }
            }
        }
        debug!("Total count still changing, giving up reconciling");
    }

    /// The window at the current offset, unless it is not ready or already
    /// inside the last requested window.
    fn pending_window(&self) -> Option<VisibleRange> {
        let inner = self.read_inner();
        if inner.phase != Phase::Ready {
            return None;
        }
        let range = self
            .config
            .range_at(inner.scroll_offset, self.coordinator.total_count())?;
        match inner.last_requested {
            Some(last) if last.covers(&range) => None,
            _ => Some(range),
        }
    }

    fn emit(&self, event: GridEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, GridInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, GridInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_scroll(&self) -> MutexGuard<'_, Option<ScrollDebouncer>> {
        self.scroll.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
