//! Simulated remote backend

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rand::Rng;
use vgrid_lib::SourceError;
use vgrid_lib::source::DataSource;
use vgrid_lib::source::FetchRequest;
use vgrid_lib::source::FetchResult;
use vgrid_lib::source::InMemorySource;

/// Wraps an [`InMemorySource`] with random latency and random failures so
/// responses overlap and arrive out of order.
pub struct JitterSource {
    inner: Arc<InMemorySource>,
    min_latency: u64,
    max_latency: u64,
    fail_rate: f64,
}

impl JitterSource {
    pub fn new(
        inner: Arc<InMemorySource>,
        min_latency_ms: u64,
        max_latency_ms: u64,
        fail_rate: f64,
    ) -> Self {
        let fail_rate = if fail_rate.is_finite() {
            fail_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            inner,
            min_latency: min_latency_ms.min(max_latency_ms),
            max_latency: min_latency_ms.max(max_latency_ms),
            fail_rate,
        }
    }

    /// Upper bound of the simulated latency.
    pub fn max_latency(&self) -> Duration {
        Duration::from_millis(self.max_latency)
    }
}

#[async_trait]
impl DataSource for JitterSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, SourceError> {
        // ThreadRng is not Send; keep it out of the await.
        let (delay, fail) = {
            let mut rng = rand::rng();
            (
                rng.random_range(self.min_latency..=self.max_latency),
                rng.random_bool(self.fail_rate),
            )
        };
        debug!(
            "Backend serving {} rows at {} for {} in {}ms",
            request.limit, request.start_index, request.token, delay
        );
        tokio::time::sleep(Duration::from_millis(delay)).await;

        if fail {
            return Err(SourceError::status(503, "simulated outage"));
        }
        self.inner.fetch(request).await
    }
}
