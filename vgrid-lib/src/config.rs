//! Grid configuration

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;
use crate::model::SortSpec;
use crate::range;
use crate::range::VisibleRange;

/// Configuration for a [`VirtualGrid`](crate::VirtualGrid).
///
/// Pixel sizes drive the index/pixel math; they are validated when the grid
/// is built so a zero row height fails immediately instead of producing
/// silent division errors later.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use vgrid_lib::GridConfig;
/// use vgrid_lib::model::SortSpec;
///
/// let config = GridConfig::default()
///     .with_row_height(24.0)
///     .with_viewport_height(600.0)
///     .with_debounce_interval(Duration::from_millis(100))
///     .with_initial_sort(SortSpec::desc("name"));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Height of one row in pixels.
    ///
    /// Default: 30
    pub row_height: f64,

    /// Height of the scrollable viewport in pixels.
    ///
    /// Default: 400
    pub viewport_height: f64,

    /// Extra rows kept above and below the viewport.
    ///
    /// Default: 10
    pub buffer_rows: usize,

    /// Quiet period after the last scroll event before the window is recomputed.
    ///
    /// Default: 200 ms
    #[serde(rename = "debounce_interval_ms", with = "duration_ms")]
    pub debounce_interval: Duration,

    /// Sort applied from mount until changed.
    ///
    /// Default: none
    pub initial_sort: SortSpec,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_height: 30.0,
            viewport_height: 400.0,
            buffer_rows: 10,
            debounce_interval: Duration::from_millis(200),
            initial_sort: SortSpec::default(),
        }
    }
}

impl GridConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the row height.
    pub fn with_row_height(mut self, row_height: f64) -> Self {
        self.row_height = row_height;
        self
    }

    /// Sets the viewport height.
    pub fn with_viewport_height(mut self, viewport_height: f64) -> Self {
        self.viewport_height = viewport_height;
        self
    }

    /// Sets the number of buffer rows.
    pub fn with_buffer_rows(mut self, buffer_rows: usize) -> Self {
        self.buffer_rows = buffer_rows;
        self
    }

    /// Sets the scroll debounce interval.
    pub fn with_debounce_interval(mut self, interval: Duration) -> Self {
        self.debounce_interval = interval;
        self
    }

    /// Sets the initial sort.
    pub fn with_initial_sort(mut self, sort: SortSpec) -> Self {
        self.initial_sort = sort;
        self
    }

    /// Checks that the pixel sizes can drive the index math.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.row_height.is_finite() || self.row_height <= 0.0 {
            return Err(ConfigError::InvalidRowHeight(self.row_height));
        }
        if !self.viewport_height.is_finite() || self.viewport_height < 0.0 {
            return Err(ConfigError::InvalidViewportHeight(self.viewport_height));
        }
        Ok(())
    }

    /// Window to display at `scroll_offset` given `total_count` rows.
    pub fn range_at(&self, scroll_offset: f64, total_count: usize) -> Option<VisibleRange> {
        range::compute(
            scroll_offset,
            self.viewport_height,
            self.row_height,
            self.buffer_rows,
            total_count,
        )
    }

    /// Window fetched at mount time.
    pub fn initial_range(&self) -> VisibleRange {
        range::initial(self.viewport_height, self.row_height, self.buffer_rows)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SortOrder;

    #[test]
    fn test_defaults() {
        let config = GridConfig::default();
        assert_eq!(config.buffer_rows, 10);
        assert_eq!(config.debounce_interval, Duration::from_millis(200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_row_height() {
        assert_eq!(
            GridConfig::default().with_row_height(0.0).validate(),
            Err(ConfigError::InvalidRowHeight(0.0))
        );
        assert!(GridConfig::default().with_row_height(-1.0).validate().is_err());
        assert!(GridConfig::default().with_row_height(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_rejects_bad_viewport() {
        assert_eq!(
            GridConfig::default().with_viewport_height(-5.0).validate(),
            Err(ConfigError::InvalidViewportHeight(-5.0))
        );
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = GridConfig::from_json(
            r#"{ "row_height": 24, "debounce_interval_ms": 50,
                 "initial_sort": { "column": "name", "order": "DESC" } }"#,
        )
        .unwrap();

        assert_eq!(config.row_height, 24.0);
        assert_eq!(config.viewport_height, 400.0);
        assert_eq!(config.debounce_interval, Duration::from_millis(50));
        assert_eq!(config.initial_sort.order, SortOrder::Descending);
    }

    #[test]
    fn test_from_json_validates() {
        assert!(matches!(
            GridConfig::from_json(r#"{ "row_height": 0 }"#),
            Err(ConfigError::InvalidRowHeight(_))
        ));
        assert!(matches!(
            GridConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_ranges() {
        let config = GridConfig::default();
        assert_eq!(config.initial_range(), VisibleRange::new(0, 33).unwrap());
        assert_eq!(config.range_at(0.0, 500), VisibleRange::new(0, 24));
        assert_eq!(config.range_at(0.0, 0), None);
    }
}
