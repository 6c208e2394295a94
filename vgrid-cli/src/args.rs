//! Command-line argument parsing for the demo
//!
//! Grid settings come from an optional JSON config file; individual flags
//! override the file.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use vgrid_lib::GridConfig;
use vgrid_lib::model::SortOrder;
use vgrid_lib::model::SortSpec;

use crate::error::CliError;

/// Drive a windowed data grid against a simulated slow backend
#[derive(Parser, Debug)]
#[command(name = "vgrid", version, about = "Windowed data grid demo")]
pub struct CliArgs {
    /// Number of rows in the simulated data set
    #[arg(long, default_value_t = 10_000, value_name = "N")]
    pub rows: usize,

    /// JSON file with grid settings
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Row height in pixels
    #[arg(long, value_name = "PX")]
    pub row_height: Option<f64>,

    /// Viewport height in pixels
    #[arg(long, value_name = "PX")]
    pub viewport_height: Option<f64>,

    /// Rows kept above and below the viewport
    #[arg(long, value_name = "N")]
    pub buffer_rows: Option<usize>,

    /// Scroll debounce interval
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Initial sort as COLUMN or COLUMN:asc|desc
    #[arg(long, value_name = "SORT")]
    pub sort: Option<String>,

    /// Search key applied after scrolling
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Scroll offsets fed as one burst (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "PX")]
    pub scroll: Vec<f64>,

    /// Minimum simulated fetch latency
    #[arg(long, default_value_t = 20, value_name = "MS")]
    pub min_latency_ms: u64,

    /// Maximum simulated fetch latency
    #[arg(long, default_value_t = 150, value_name = "MS")]
    pub max_latency_ms: u64,

    /// Probability that a simulated fetch fails (0.0 - 1.0)
    #[arg(long, default_value_t = 0.0, value_name = "P")]
    pub fail_rate: f64,

    /// Log file (defaults to a new session log in the platform cache directory)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Session logs to keep, including the current one
    #[arg(long, default_value_t = 10, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub keep_logs: u16,

    /// Mirror log output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Builds the grid configuration: file first, then flag overrides.
    pub fn grid_config(&self) -> Result<GridConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
                GridConfig::from_json(&json)?
            }
            None => GridConfig::default(),
        };

        if let Some(row_height) = self.row_height {
            config = config.with_row_height(row_height);
        }
        if let Some(viewport_height) = self.viewport_height {
            config = config.with_viewport_height(viewport_height);
        }
        if let Some(buffer_rows) = self.buffer_rows {
            config = config.with_buffer_rows(buffer_rows);
        }
        if let Some(ms) = self.debounce_ms {
            config = config.with_debounce_interval(Duration::from_millis(ms));
        }
        if let Some(sort) = &self.sort {
            config = config.with_initial_sort(parse_sort(sort)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Scroll offsets for the burst, defaulting to five steps down to
    /// roughly the middle of the data set.
    pub fn scroll_burst(&self, config: &GridConfig) -> Vec<f64> {
        if !self.scroll.is_empty() {
            return self.scroll.clone();
        }
        let target = (self.rows / 2) as f64 * config.row_height;
        (1..=5).map(|step| target * step as f64 / 5.0).collect()
    }
}

fn parse_sort(value: &str) -> Result<SortSpec, CliError> {
    let (column, order) = match value.split_once(':') {
        Some((column, order)) => (
            column,
            order
                .parse::<SortOrder>()
                .map_err(|e| CliError::InvalidArgument(e.to_string()))?,
        ),
        None => (value, SortOrder::Ascending),
    };
    if column.trim().is_empty() {
        return Err(CliError::InvalidArgument(format!(
            "Sort needs a column: {}",
            value
        )));
    }
    Ok(SortSpec::new(column.trim(), order))
}
