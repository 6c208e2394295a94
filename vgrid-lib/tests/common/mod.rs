//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use vgrid_lib::SourceError;
use vgrid_lib::VisibleRange;
use vgrid_lib::model::Row;
use vgrid_lib::source::DataSource;
use vgrid_lib::source::FetchRequest;
use vgrid_lib::source::FetchResult;

/// A fetch parked inside [`GatedSource`] until the test answers it.
pub struct Pending {
    pub request: FetchRequest,
    reply: oneshot::Sender<Result<FetchResult, SourceError>>,
}

impl Pending {
    /// Answers with an explicit result.
    pub fn respond(self, result: Result<FetchResult, SourceError>) {
        // The fetch may have been dropped; nothing to do then.
        let _ = self.reply.send(result);
    }

    /// Answers with `total_count` rows, serving the requested window.
    pub fn serve(self, total_count: usize, label: &str) {
        let end = self.request.end_index().min(total_count);
        let items = labelled(self.request.start_index, end, label);
        self.respond(Ok(FetchResult::new(items, total_count)));
    }

    /// Answers with an error.
    pub fn fail(self, error: SourceError) {
        self.respond(Err(error));
    }
}

/// A data source whose fetches only complete when the test says so.
///
/// Each fetch is forwarded on a channel as a [`Pending`], which lets tests
/// resolve concurrent requests in any order.
pub struct GatedSource {
    requests: mpsc::UnboundedSender<Pending>,
}

pub fn gated() -> (Arc<GatedSource>, mpsc::UnboundedReceiver<Pending>) {
    let (requests, rx) = mpsc::unbounded_channel();
    (Arc::new(GatedSource { requests }), rx)
}

#[async_trait]
impl DataSource for GatedSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, SourceError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Pending {
                request: request.clone(),
                reply,
            })
            .map_err(|_| SourceError::transport("gate closed"))?;
        response
            .await
            .map_err(|_| SourceError::transport("request abandoned"))?
    }
}

/// Rows `start..end`, each carrying its index and a label.
pub fn labelled(start: usize, end: usize, label: &str) -> Vec<Row> {
    (start..end)
        .map(|i| Row::new().set("id", i).set("label", label))
        .collect()
}

/// `count` brand rows with names, creation dates and scores.
pub fn brands(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            Row::new()
                .set("id", i)
                .set("name", format!("Brand {:03}", i))
                .set("createdAt", format!("2024-01-{:02}T08:00:00Z", i % 28 + 1))
                .set("score", (i * 37) % 101)
        })
        .collect()
}

pub fn range(start: usize, end: usize) -> VisibleRange {
    VisibleRange::new(start, end).unwrap()
}
