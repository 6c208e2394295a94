//! In-memory data source

use std::cmp::Ordering;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::DataSource;
use super::FetchRequest;
use super::FetchResult;
use crate::error::SourceError;
use crate::model::Row;
use crate::model::SortOrder;

/// A data source serving rows from a vector.
///
/// Filters by search key (case-insensitive substring over string and number
/// fields), sorts by the requested column, then pages by offset/limit. The
/// reported total count is the number of rows matching the search key.
/// Useful as a reference backend and in tests.
///
/// # Example
///
/// ```
/// use vgrid_lib::model::Row;
/// use vgrid_lib::source::InMemorySource;
///
/// let source = InMemorySource::new(vec![
///     Row::new().set("name", "b"),
///     Row::new().set("name", "a"),
/// ]);
/// assert_eq!(source.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct InMemorySource {
    rows: RwLock<Vec<Row>>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl InMemorySource {
    /// Creates a source over the given rows.
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: RwLock::new(rows),
            latency: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Delays every fetch by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns the number of rows held, ignoring any search key.
    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if the source holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns how many fetches have been served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(AtomicOrdering::SeqCst)
    }

    /// Appends a row.
    pub fn push(&self, row: Row) {
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row);
    }

    /// Removes every row matching `predicate`, returning how many were removed.
    pub fn remove_where(&self, predicate: impl Fn(&Row) -> bool) -> usize {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let before = rows.len();
        rows.retain(|row| !predicate(row));
        before - rows.len()
    }

    /// Answers a request synchronously.
    pub fn query(&self, request: &FetchRequest) -> FetchResult {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);

        let needle = request
            .search_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_lowercase);

        let mut matching: Vec<&Row> = rows
            .iter()
            .filter(|row| needle.as_deref().is_none_or(|needle| matches_search(row, needle)))
            .collect();

        if !request.sort_column.is_empty() && request.sort_order != SortOrder::Unspecified {
            let column = request.sort_column.as_str();
            let descending = request.sort_order == SortOrder::Descending;
            matching.sort_by(|a, b| compare_fields(a.get(column), b.get(column), descending));
        }

        let total_count = matching.len();
        let items = matching
            .into_iter()
            .skip(request.start_index)
            .take(request.limit)
            .cloned()
            .collect();

        FetchResult::new(items, total_count)
    }
}

#[async_trait]
impl DataSource for InMemorySource {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, SourceError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.fetches.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(self.query(request))
    }
}

fn matches_search(row: &Row, needle: &str) -> bool {
    row.fields().values().any(|value| match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        _ => false,
    })
}

/// Orders two field values. Missing and null values sort last in both
/// directions.
fn compare_fields(a: Option<&Value>, b: Option<&Value>, descending: bool) -> Ordering {
    let a = a.filter(|value| !value.is_null());
    let b = b.filter(|value| !value.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = compare_values(a, b);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 5,
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
    }
}
