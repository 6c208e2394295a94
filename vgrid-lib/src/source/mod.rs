//! Data source abstraction
//!
//! The engine treats the data source as an opaque, possibly slow, possibly
//! failing remote call: `fetch(range, sort) -> (rows, total_count)`.

mod memory;

pub use memory::*;

use std::future::Future;

use async_trait::async_trait;

use crate::coordinator::RequestToken;
use crate::error::SourceError;
use crate::model::Row;
use crate::model::SortOrder;

/// An offset/limit request for a window of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Absolute index of the first requested row.
    pub start_index: usize,
    /// Number of rows requested. Always at least 1.
    pub limit: usize,
    /// Column to sort by. Empty means no column.
    pub sort_column: String,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// Optional free-text filter.
    pub search_key: Option<String>,
    /// Token the coordinator minted for this request.
    pub token: RequestToken,
}

impl FetchRequest {
    /// Index one past the last requested row.
    pub fn end_index(&self) -> usize {
        self.start_index + self.limit
    }
}

/// A window of rows returned by the data source.
///
/// `items[i]` is the row at absolute index `start_index + i` of the request
/// that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    /// Rows in order, starting at the request's `start_index`.
    pub items: Vec<Row>,
    /// Total number of rows the source currently holds for the query.
    pub total_count: usize,
}

impl FetchResult {
    /// Creates a fetch result.
    pub fn new(items: Vec<Row>, total_count: usize) -> Self {
        Self { items, total_count }
    }

    /// A result with no rows and a total count of zero.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the number of rows in this result.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if this result has no rows.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Trait for paginated row sources.
///
/// Implementations own their transport, retries and timeouts; the engine
/// never cancels a fetch, it only ignores results that were superseded.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches `request.limit` rows starting at `request.start_index`.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, SourceError>;
}

/// Adapts an async closure into a [`DataSource`].
///
/// # Example
///
/// ```
/// use vgrid_lib::source::{FetchResult, FnSource};
///
/// let source = FnSource::new(|request| async move {
///     let _ = request.start_index;
///     Ok(FetchResult::empty())
/// });
/// ```
pub struct FnSource<F> {
    f: F,
}

impl<F, Fut> FnSource<F>
where
    F: Fn(FetchRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FetchResult, SourceError>> + Send + 'static,
{
    /// Wraps a closure taking an owned request.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> DataSource for FnSource<F>
where
    F: Fn(FetchRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FetchResult, SourceError>> + Send + 'static,
{
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, SourceError> {
        (self.f)(request.clone()).await
    }
}
