//! Integration tests for the grid lifecycle.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::GatedSource;
use common::brands;
use common::gated;
use common::range;
use tokio::sync::broadcast;
use vgrid_lib::FetchOutcome;
use vgrid_lib::GridConfig;
use vgrid_lib::GridError;
use vgrid_lib::GridEvent;
use vgrid_lib::LoadKind;
use vgrid_lib::Phase;
use vgrid_lib::RowSlot;
use vgrid_lib::SourceError;
use vgrid_lib::VirtualGrid;
use vgrid_lib::model::SortOrder;
use vgrid_lib::model::SortSpec;
use vgrid_lib::source::InMemorySource;

fn grid<S: vgrid_lib::source::DataSource + 'static>(source: Arc<S>) -> Arc<VirtualGrid<S>> {
    Arc::new(VirtualGrid::new(source, GridConfig::default()).unwrap())
}

/// Mounts against a gated source, answering the initial fetch with
/// `total_count` rows.
async fn mounted(
    total_count: usize,
) -> (
    Arc<VirtualGrid<GatedSource>>,
    tokio::sync::mpsc::UnboundedReceiver<common::Pending>,
) {
    let (source, mut pending) = gated();
    let grid = grid(source);

    let mount = tokio::spawn({
        let grid = grid.clone();
        async move { grid.mount().await }
    });
    pending.recv().await.unwrap().serve(total_count, "initial");
    mount.await.unwrap().unwrap();

    (grid, pending)
}

fn drain(events: &mut broadcast::Receiver<GridEvent>) -> Vec<GridEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

// =============================================================================
// Mount
// =============================================================================

#[tokio::test]
async fn test_mount_blocks_until_initial_load() {
    let (source, mut pending) = gated();
    let grid = grid(source);
    assert_eq!(grid.phase(), Phase::Uninitialized);
    assert!(grid.snapshot().is_blocking());

    let mount = tokio::spawn({
        let grid = grid.clone();
        async move { grid.mount().await }
    });

    let initial = pending.recv().await.unwrap();
    assert_eq!(initial.request.start_index, 0);
    assert_eq!(initial.request.limit, 34);
    assert_eq!(grid.phase(), Phase::Loading(LoadKind::Initial));
    assert!(grid.snapshot().is_blocking());

    initial.serve(500, "initial");
    let outcome = mount.await.unwrap().unwrap();

    assert!(matches!(
        outcome,
        FetchOutcome::Applied {
            rows: 34,
            total_count: 500,
            ..
        }
    ));
    assert_eq!(grid.phase(), Phase::Ready);

    let snapshot = grid.snapshot();
    assert_eq!(snapshot.visible_range(), Some(range(0, 24)));
    assert_eq!(snapshot.loaded_count(), 25);
    assert_eq!(snapshot.total_count(), 500);
    assert_eq!(grid.cached_len(), 34);
}

#[tokio::test]
async fn test_mount_twice_is_rejected() {
    let (grid, _pending) = mounted(50).await;
    assert_eq!(grid.mount().await, Err(GridError::AlreadyMounted));
}

#[tokio::test]
async fn test_failed_mount_still_becomes_ready() {
    let (source, mut pending) = gated();
    let grid = grid(source);

    let mount = tokio::spawn({
        let grid = grid.clone();
        async move { grid.mount().await }
    });
    pending
        .recv()
        .await
        .unwrap()
        .fail(SourceError::Timeout(Duration::from_secs(30)));

    let err = mount.await.unwrap().unwrap_err();
    assert!(matches!(err, GridError::Fetch { .. }));
    assert_eq!(grid.phase(), Phase::Ready);
    assert!(grid.snapshot().is_empty());
}

// =============================================================================
// Scrolling
// =============================================================================

#[tokio::test]
async fn test_scroll_fetches_new_window() {
    let (grid, mut pending) = mounted(500).await;

    let scroll = tokio::spawn({
        let grid = grid.clone();
        async move { grid.apply_scroll(3000.0).await }
    });
    let request = pending.recv().await.unwrap();
    assert_eq!(request.request.start_index, 90);
    assert_eq!(request.request.limit, 35);

    // Rows outside the cache render as placeholders while in flight.
    let snapshot = grid.snapshot();
    assert_eq!(snapshot.visible_range(), Some(range(90, 124)));
    assert_eq!(snapshot.loaded_count(), 0);

    request.serve(500, "scrolled");
    assert!(scroll.await.unwrap().unwrap().is_applied());

    let snapshot = grid.snapshot();
    assert_eq!(snapshot.placeholder_count(), 0);
    match snapshot.row(100) {
        Some(RowSlot::Loaded(row)) => assert_eq!(row.get_i64("id"), Some(100)),
        other => panic!("expected row 100 to be loaded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_same_window_is_not_refetched() {
    let source = Arc::new(InMemorySource::new(brands(500)));
    let grid = grid(source.clone());
    grid.mount().await.unwrap();

    assert!(grid.apply_scroll(3000.0).await.unwrap().is_applied());
    assert_eq!(grid.apply_scroll(3005.0).await, Ok(FetchOutcome::Skipped));
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_empty_source_never_fetches_on_scroll() {
    let source = Arc::new(InMemorySource::new(Vec::new()));
    let grid = grid(source.clone());

    grid.mount().await.unwrap();
    assert_eq!(grid.apply_scroll(300.0).await, Ok(FetchOutcome::Skipped));

    assert_eq!(source.fetch_count(), 1);
    let snapshot = grid.snapshot();
    assert!(snapshot.is_empty());
    assert!(snapshot.rows().is_empty());
    assert_eq!(snapshot.content_height(), 0.0);
}

#[tokio::test]
async fn test_scroll_while_loading_is_deferred() {
    let (source, mut pending) = gated();
    let grid = grid(source);

    let mount = tokio::spawn({
        let grid = grid.clone();
        async move { grid.mount().await }
    });
    let initial = pending.recv().await.unwrap();

    assert_eq!(grid.apply_scroll(3000.0).await, Ok(FetchOutcome::Deferred));
    initial.serve(500, "initial");

    // The settled offset is fetched as soon as the load completes.
    let deferred = pending.recv().await.unwrap();
    assert_eq!(deferred.request.start_index, 90);
    deferred.serve(500, "deferred");
    mount.await.unwrap().unwrap();

    assert_eq!(grid.last_requested(), Some(range(90, 124)));
    assert_eq!(grid.snapshot().loaded_count(), 35);
}

#[tokio::test]
async fn test_failed_fetch_keeps_cache_and_reports() {
    let (grid, mut pending) = mounted(500).await;
    let mut events = grid.subscribe();

    let scroll = tokio::spawn({
        let grid = grid.clone();
        async move { grid.apply_scroll(3000.0).await }
    });
    pending
        .recv()
        .await
        .unwrap()
        .fail(SourceError::status(503, "unavailable"));

    let err = scroll.await.unwrap().unwrap_err();
    assert_eq!(err.source_error(), Some(&SourceError::status(503, "unavailable")));
    assert_eq!(grid.cached_len(), 34);
    assert_eq!(grid.phase(), Phase::Ready);
    assert_eq!(grid.last_requested(), None);
    assert!(
        drain(&mut events)
            .iter()
            .any(|event| matches!(event, GridEvent::FetchFailed { range: r, .. } if *r == range(90, 124)))
    );

    // The same window can be retried.
    let retry = tokio::spawn({
        let grid = grid.clone();
        async move { grid.apply_scroll(3000.0).await }
    });
    pending.recv().await.unwrap().serve(500, "retry");
    assert!(retry.await.unwrap().unwrap().is_applied());
}

#[tokio::test(start_paused = true)]
async fn test_scroll_burst_is_debounced() {
    let source = Arc::new(InMemorySource::new(brands(500)));
    let grid = grid(source.clone());
    grid.mount().await.unwrap();

    for step in 1..=5 {
        grid.scroll(step as f64 * 600.0).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(source.fetch_count(), 1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    tokio::task::yield_now().await;

    assert_eq!(source.fetch_count(), 2);
    assert_eq!(grid.scroll_offset(), 3000.0);
    assert_eq!(grid.last_requested(), Some(range(90, 124)));
}

#[tokio::test]
async fn test_scroll_before_mount_is_rejected() {
    let grid = grid(Arc::new(InMemorySource::new(brands(10))));
    assert_eq!(grid.scroll(100.0), Err(GridError::NotMounted));
    assert_eq!(grid.apply_scroll(100.0).await, Err(GridError::NotMounted));
    assert_eq!(grid.refresh().await, Err(GridError::NotMounted));
}

// =============================================================================
// Refresh, sort and search
// =============================================================================

#[tokio::test]
async fn test_refresh_clears_then_refetches_current_window() {
    let (grid, mut pending) = mounted(500).await;

    let scroll = tokio::spawn({
        let grid = grid.clone();
        async move { grid.apply_scroll(3000.0).await }
    });
    pending.recv().await.unwrap().serve(500, "scrolled");
    scroll.await.unwrap().unwrap();

    let mut events = grid.subscribe();
    let refresh = tokio::spawn({
        let grid = grid.clone();
        async move { grid.refresh().await }
    });
    let request = pending.recv().await.unwrap();

    assert_eq!(request.request.start_index, 90);
    assert_eq!(grid.cached_len(), 0);
    assert_eq!(grid.phase(), Phase::Loading(LoadKind::Refresh));
    let snapshot = grid.snapshot();
    assert!(!snapshot.is_blocking());
    assert_eq!(snapshot.placeholder_count(), 35);

    request.serve(480, "refreshed");
    assert!(refresh.await.unwrap().unwrap().is_applied());

    assert_eq!(grid.phase(), Phase::Ready);
    assert_eq!(grid.cached_len(), 35);
    assert_eq!(grid.total_count(), 480);

    let events = drain(&mut events);
    assert_eq!(events[0], GridEvent::CacheInvalidated);
    assert_eq!(events[1], GridEvent::PhaseChanged(Phase::Loading(LoadKind::Refresh)));
    assert_eq!(events.last(), Some(&GridEvent::PhaseChanged(Phase::Ready)));
}

#[tokio::test]
async fn test_refresh_discards_in_flight_scroll() {
    let (grid, mut pending) = mounted(500).await;

    let scroll = tokio::spawn({
        let grid = grid.clone();
        async move { grid.apply_scroll(3000.0).await }
    });
    let stale = pending.recv().await.unwrap();

    let refresh = tokio::spawn({
        let grid = grid.clone();
        async move { grid.refresh().await }
    });
    let fresh = pending.recv().await.unwrap();

    stale.serve(500, "stale");
    assert!(scroll.await.unwrap().unwrap().is_stale());
    assert_eq!(grid.cached_len(), 0);

    fresh.serve(500, "fresh");
    refresh.await.unwrap().unwrap();
    assert_eq!(grid.cached_row(90).unwrap().get_str("label"), Some("fresh"));
}

#[tokio::test]
async fn test_sort_change_refreshes_with_new_sort() {
    let (grid, mut pending) = mounted(500).await;

    let sort = tokio::spawn({
        let grid = grid.clone();
        async move { grid.set_sort(SortSpec::desc("name")).await }
    });
    let request = pending.recv().await.unwrap();
    assert_eq!(request.request.sort_column, "name");
    assert_eq!(request.request.sort_order, SortOrder::Descending);
    assert_eq!(grid.cached_len(), 0);

    request.serve(500, "sorted");
    assert!(sort.await.unwrap().unwrap().is_applied());

    // Unchanged sort is a no-op.
    assert_eq!(
        grid.set_sort(SortSpec::desc("name")).await,
        Ok(FetchOutcome::Skipped)
    );
}

#[tokio::test]
async fn test_search_narrows_total() {
    let source = Arc::new(InMemorySource::new(brands(500)));
    let grid = grid(source.clone());
    grid.mount().await.unwrap();

    let outcome = grid
        .set_search_key(Some("brand 04".to_string()))
        .await
        .unwrap();
    assert!(matches!(outcome, FetchOutcome::Applied { total_count: 10, .. }));
    assert_eq!(grid.snapshot().visible_range(), Some(range(0, 9)));

    assert_eq!(
        grid.set_search_key(Some("brand 04".to_string())).await,
        Ok(FetchOutcome::Skipped)
    );

    // An empty key clears the search.
    let outcome = grid.set_search_key(Some(String::new())).await.unwrap();
    assert!(matches!(outcome, FetchOutcome::Applied { total_count: 500, .. }));
    assert_eq!(grid.search_key(), None);
}

#[tokio::test]
async fn test_refresh_after_delete_shrinks_total() {
    let source = Arc::new(InMemorySource::new(brands(30)));
    let grid = grid(source.clone());
    grid.mount().await.unwrap();
    assert_eq!(grid.total_count(), 30);

    source.remove_where(|row| row.get_i64("id") == Some(3));
    grid.refresh().await.unwrap();

    assert_eq!(grid.total_count(), 29);
    assert_eq!(grid.snapshot().visible_range(), Some(range(0, 24)));
    assert_eq!(grid.cached_row(3).unwrap().get_i64("id"), Some(4));
}

#[tokio::test]
async fn test_refresh_after_insert_grows_total() {
    let source = Arc::new(InMemorySource::new(brands(30)));
    let grid = grid(source.clone());
    grid.mount().await.unwrap();

    for row in brands(35).into_iter().skip(30) {
        source.push(row);
    }
    grid.refresh().await.unwrap();

    assert_eq!(grid.total_count(), 35);
    assert_eq!(grid.snapshot().content_height(), 35.0 * 30.0);
}

// =============================================================================
// Shrinking totals while scrolled deep
// =============================================================================

#[tokio::test]
async fn test_search_while_scrolled_deep_refetches_last_rows() {
    let source = Arc::new(InMemorySource::new(brands(500)));
    let grid = grid(source.clone());
    grid.mount().await.unwrap();
    grid.apply_scroll(3000.0).await.unwrap();

    // The refresh asks for rows 90-124 of a list that now has 10 rows.
    let outcome = grid
        .set_search_key(Some("brand 00".to_string()))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        FetchOutcome::Applied {
            rows: 0,
            total_count: 10,
            ..
        }
    ));

    let snapshot = grid.snapshot();
    assert_eq!(snapshot.visible_range(), Some(range(0, 9)));
    assert_eq!(snapshot.loaded_count(), 10);
    assert_eq!(snapshot.placeholder_count(), 0);
    assert_eq!(grid.last_requested(), Some(range(0, 9)));
    assert_eq!(source.fetch_count(), 4);
}

#[tokio::test]
async fn test_refresh_shrink_refetches_window_at_new_bottom() {
    let (grid, mut pending) = mounted(500).await;

    let scroll = tokio::spawn({
        let grid = grid.clone();
        async move { grid.apply_scroll(3000.0).await }
    });
    pending.recv().await.unwrap().serve(500, "scrolled");
    scroll.await.unwrap().unwrap();

    let refresh = tokio::spawn({
        let grid = grid.clone();
        async move { grid.refresh().await }
    });
    let request = pending.recv().await.unwrap();
    assert_eq!(request.request.start_index, 90);
    request.serve(40, "refreshed");

    // The offset now lies past the end; the last viewport is fetched.
    let follow_up = pending.recv().await.unwrap();
    assert_eq!(follow_up.request.start_index, 16);
    assert_eq!(follow_up.request.limit, 24);
    assert_eq!(grid.phase(), Phase::Ready);
    follow_up.serve(40, "bottom");

    let outcome = refresh.await.unwrap().unwrap();
    assert!(matches!(
        outcome,
        FetchOutcome::Applied {
            rows: 0,
            total_count: 40,
            ..
        }
    ));

    let snapshot = grid.snapshot();
    assert_eq!(snapshot.visible_range(), Some(range(16, 39)));
    assert_eq!(snapshot.loaded_count(), 24);
    assert_eq!(snapshot.placeholder_count(), 0);
    assert_eq!(grid.cached_row(39).unwrap().get_str("label"), Some("bottom"));
}

#[tokio::test]
async fn test_scroll_response_with_smaller_total_refetches() {
    let (grid, mut pending) = mounted(500).await;

    let scroll = tokio::spawn({
        let grid = grid.clone();
        async move { grid.apply_scroll(3000.0).await }
    });
    pending.recv().await.unwrap().serve(40, "shrunk");

    let follow_up = pending.recv().await.unwrap();
    assert_eq!(follow_up.request.start_index, 16);
    follow_up.serve(40, "bottom");

    assert!(matches!(
        scroll.await.unwrap().unwrap(),
        FetchOutcome::Applied {
            total_count: 40,
            total_changed: true,
            ..
        }
    ));
    assert_eq!(grid.last_requested(), Some(range(16, 39)));
    assert_eq!(grid.snapshot().placeholder_count(), 0);
}

#[tokio::test]
async fn test_reconciling_stops_when_total_keeps_changing() {
    let (grid, mut pending) = mounted(500).await;

    let scroll = tokio::spawn({
        let grid = grid.clone();
        async move { grid.apply_scroll(3000.0).await }
    });
    pending.recv().await.unwrap().serve(60, "first");

    // Every follow-up reports a smaller total than the one before.
    for total in [50, 45, 41] {
        pending.recv().await.unwrap().serve(total, "moving");
    }
    scroll.await.unwrap().unwrap();

    assert!(pending.try_recv().is_err());
    assert_eq!(grid.total_count(), 41);
    assert_eq!(grid.phase(), Phase::Ready);
}

#[tokio::test]
async fn test_sort_before_mount_is_used_by_initial_load() {
    let source = Arc::new(InMemorySource::new(brands(100)));
    let grid = grid(source.clone());

    assert_eq!(
        grid.set_sort(SortSpec::desc("id")).await,
        Ok(FetchOutcome::Skipped)
    );
    assert_eq!(source.fetch_count(), 0);

    grid.mount().await.unwrap();
    assert_eq!(grid.cached_row(0).unwrap().get_i64("id"), Some(99));
}

// =============================================================================
// Unmount
// =============================================================================

#[tokio::test]
async fn test_unmount_discards_in_flight_and_rejects_work() {
    let (grid, mut pending) = mounted(500).await;

    let scroll = tokio::spawn({
        let grid = grid.clone();
        async move { grid.apply_scroll(3000.0).await }
    });
    let in_flight = pending.recv().await.unwrap();

    grid.unmount();
    in_flight.serve(500, "late");

    assert!(scroll.await.unwrap().unwrap().is_stale());
    assert_eq!(grid.phase(), Phase::Unmounted);
    assert!(grid.cached_row(90).is_none());
    assert_eq!(grid.scroll(0.0), Err(GridError::Unmounted));
    assert_eq!(grid.apply_scroll(0.0).await, Err(GridError::Unmounted));
    assert_eq!(grid.refresh().await, Err(GridError::Unmounted));
    assert_eq!(grid.mount().await, Err(GridError::Unmounted));

    // Unmounting twice is harmless.
    grid.unmount();
}
