//! Scripted demo session
//!
//! Mounts a grid over generated rows, scrolls in a burst, re-sorts,
//! optionally searches, deletes a row through its action and refreshes,
//! printing the rendered window after each step.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use log::debug;
use log::info;
use log::warn;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use vgrid_lib::FetchOutcome;
use vgrid_lib::GridConfig;
use vgrid_lib::GridError;
use vgrid_lib::GridEvent;
use vgrid_lib::TableView;
use vgrid_lib::VirtualGrid;
use vgrid_lib::column::CellFormat;
use vgrid_lib::column::Column;
use vgrid_lib::column::ColumnWidth;
use vgrid_lib::model::Row;
use vgrid_lib::model::SortSpec;
use vgrid_lib::source::DataSource;
use vgrid_lib::source::InMemorySource;

use crate::args::CliArgs;
use crate::error::CliError;
use crate::source::JitterSource;

const BRANDS: [&str; 6] = [
    "Contoso",
    "Fabrikam",
    "Northwind",
    "Tailspin",
    "Woodgrove",
    "Litware",
];

/// 2024-01-01T00:00:00Z
const FIRST_CREATED: i64 = 1_704_067_200;

const SCROLL_STEP: Duration = Duration::from_millis(20);
const SETTLE_MARGIN: Duration = Duration::from_millis(250);

const ACTIONS_COLUMN: usize = 3;
const DELETE_ACTION: usize = 1;

/// Generates `count` brand rows.
pub fn generate_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            let created = DateTime::from_timestamp(FIRST_CREATED + i as i64 * 3_600, 0)
                .map(|created| created.to_rfc3339());
            Row::new()
                .set("id", i)
                .set("name", format!("{} {:05}", BRANDS[i % BRANDS.len()], i))
                .set("createdAt", created)
                .set("score", (i * 37) % 101)
        })
        .collect()
}

/// Columns shown by the demo. Delete removes the row from `data`; the grid
/// picks the change up on its next refresh.
pub fn table_view(data: Arc<InMemorySource>) -> TableView {
    TableView::new(vec![
        Column::property("Name", "name").into(),
        Column::property("Created", "createdAt")
            .format(CellFormat::Date)
            .into(),
        Column::property("Score", "score")
            .width(ColumnWidth::Fixed(5))
            .into(),
        Column::template("Actions")
            .action("Edit", |row| {
                info!("Edit requested for {}", row.get_str("name").unwrap_or("?"));
            })
            .action("Delete", move |row| {
                let Some(id) = row.get_i64("id") else {
                    return;
                };
                let removed = data.remove_where(|candidate| candidate.get_i64("id") == Some(id));
                info!("Deleted row {} ({} removed)", id, removed);
            })
            .into(),
    ])
}

pub async fn run(args: &CliArgs, config: GridConfig) -> Result<(), CliError> {
    let data = Arc::new(InMemorySource::new(generate_rows(args.rows)));
    let source = Arc::new(JitterSource::new(
        data.clone(),
        args.min_latency_ms,
        args.max_latency_ms,
        args.fail_rate,
    ));
    let settle_timeout = config.debounce_interval + source.max_latency() + SETTLE_MARGIN;
    let burst = args.scroll_burst(&config);

    let grid = Arc::new(VirtualGrid::new(source, config)?);
    let view = table_view(data);
    let logger = tokio::spawn(log_events(grid.subscribe()));

    section("mount");
    report(grid.mount().await)?;
    show(&view, &grid);

    section("scroll");
    let mut events = grid.subscribe();
    for offset in burst {
        grid.scroll(offset)?;
        tokio::time::sleep(SCROLL_STEP).await;
    }
    wait_for_fetch(&mut events, settle_timeout).await;
    show(&view, &grid);

    section("sort by name, descending");
    report(grid.set_sort(SortSpec::desc("name")).await)?;
    show(&view, &grid);

    if let Some(search) = &args.search {
        section(&format!("search {:?}", search));
        report(grid.set_search_key(Some(search.clone())).await)?;
        show(&view, &grid);
    }

    section("delete first visible row");
    let snapshot = grid.snapshot();
    let deleted = snapshot
        .rows()
        .iter()
        .find(|(_, slot)| slot.is_loaded())
        .is_some_and(|(index, _)| view.activate(&snapshot, *index, ACTIONS_COLUMN, DELETE_ACTION));
    if deleted {
        report(grid.refresh().await)?;
    } else {
        println!("Nothing loaded to delete");
    }
    show(&view, &grid);

    grid.unmount();
    logger.abort();
    info!("Demo finished");
    Ok(())
}

fn section(title: &str) {
    println!();
    println!("== {} ==", title);
}

fn show<S: DataSource + ?Sized + 'static>(view: &TableView, grid: &VirtualGrid<S>) {
    print!("{}", view.render_text(&grid.snapshot()));
}

/// Fetch failures are shown and the session continues; anything else ends it.
fn report(result: Result<FetchOutcome, GridError>) -> Result<(), CliError> {
    match result {
        Ok(outcome) => {
            debug!("Outcome: {:?}", outcome);
            Ok(())
        }
        Err(err @ GridError::Fetch { .. }) => {
            println!("Fetch failed: {}", err);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Waits until the debounced scroll fetch lands or fails.
async fn wait_for_fetch(events: &mut broadcast::Receiver<GridEvent>, limit: Duration) {
    let settled = tokio::time::timeout(limit, async {
        loop {
            match events.recv().await {
                Ok(GridEvent::RowsLoaded { .. } | GridEvent::FetchFailed { .. }) => break,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
    .await;
    if settled.is_err() {
        debug!("No fetch settled within {:?}", limit);
    }
}

async fn log_events(mut events: broadcast::Receiver<GridEvent>) {
    loop {
        match events.recv().await {
            Ok(GridEvent::PhaseChanged(phase)) => info!("Phase: {}", phase),
            Ok(GridEvent::RowsLoaded {
                token,
                range,
                rows,
                total_count,
            }) => info!(
                "Fetch {} loaded {} rows for {} (total {})",
                token, rows, range, total_count
            ),
            Ok(GridEvent::FetchFailed { range, error }) => {
                warn!("Rows {} failed to load: {}", range, error)
            }
            Ok(GridEvent::CacheInvalidated) => info!("Cache invalidated"),
            Err(RecvError::Lagged(missed)) => warn!("Missed {} grid events", missed),
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_generate_rows() {
        let rows = generate_rows(8);
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[1].get_str("name"), Some("Fabrikam 00001"));
        assert_eq!(rows[7].get_str("name"), Some("Fabrikam 00007"));
        assert_eq!(
            rows[2].get_str("createdAt"),
            Some("2024-01-01T02:00:00+00:00")
        );
    }

    #[tokio::test]
    async fn test_session_runs_to_completion() {
        let args = CliArgs::parse_from([
            "vgrid",
            "--rows",
            "200",
            "--min-latency-ms",
            "0",
            "--max-latency-ms",
            "5",
            "--search",
            "contoso",
        ]);
        let config = args.grid_config().unwrap();
        assert!(run(&args, config).await.is_ok());
    }
}
