//! Trailing-edge debouncing of scroll events.
//!
//! [`Debounce`] is the clock-free state machine; [`ScrollDebouncer`] runs it
//! on a tokio task, fed by a channel of raw scroll offsets and emitting the
//! last offset of each burst once the burst has been quiet for the
//! configured interval.

use std::time::Duration;

use log::trace;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Trailing-edge debounce state.
///
/// Every [`push`](Debounce::push) replaces the pending value and restarts
/// the quiet period. There is no leading-edge emission.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tokio::time::Instant;
/// use vgrid_lib::debounce::Debounce;
///
/// let mut debounce = Debounce::new(Duration::from_millis(200));
/// let t0 = Instant::now();
///
/// debounce.push(10.0, t0);
/// debounce.push(20.0, t0 + Duration::from_millis(50));
///
/// assert_eq!(debounce.poll(t0 + Duration::from_millis(200)), None);
/// assert_eq!(debounce.poll(t0 + Duration::from_millis(250)), Some(20.0));
/// ```
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    interval: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    /// Creates a debouncer with the given quiet period.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    /// Records an event observed at `now`, restarting the quiet period.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.interval));
    }

    /// Returns when the pending value becomes due, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Returns `true` if a value is waiting for its quiet period to end.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the pending value if its quiet period has elapsed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, deadline)) if deadline <= now => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    /// Drops the pending value without emitting it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }
}

/// Scroll debouncer running on a tokio task.
///
/// Raw offsets go in through [`push`](ScrollDebouncer::push); settled
/// offsets come out of the receiver returned by
/// [`spawn`](ScrollDebouncer::spawn). Shutting down (or dropping) the
/// debouncer cancels any pending timer, so nothing is emitted afterwards.
#[derive(Debug)]
pub struct ScrollDebouncer {
    input: mpsc::UnboundedSender<f64>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ScrollDebouncer {
    /// Starts the debouncer task. Must be called within a tokio runtime.
    pub fn spawn(interval: Duration) -> (Self, mpsc::UnboundedReceiver<f64>) {
        let (input, events) = mpsc::unbounded_channel();
        let (output, settled) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(
            Debounce::new(interval),
            events,
            output,
            cancel.clone(),
        ));

        let debouncer = Self {
            input,
            cancel,
            task: Some(task),
        };
        (debouncer, settled)
    }

    /// Feeds a raw scroll offset. Returns `false` once shut down.
    pub fn push(&self, offset: f64) -> bool {
        !self.cancel.is_cancelled() && self.input.send(offset).is_ok()
    }

    /// Returns `true` until the debouncer has been shut down.
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Cancels the pending timer and stops the task.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ScrollDebouncer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run(
    mut debounce: Debounce<f64>,
    mut events: mpsc::UnboundedReceiver<f64>,
    output: mpsc::UnboundedSender<f64>,
    cancel: CancellationToken,
) {
    loop {
        let deadline = debounce.deadline();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                if debounce.cancel().is_some() {
                    trace!("Debouncer cancelled with a pending offset");
                }
                break;
            }
            event = events.recv() => match event {
                Some(offset) => {
                    trace!("Scroll event at offset {}", offset);
                    debounce.push(offset, Instant::now());
                }
                None => break,
            },
            _ = sleep_until(deadline) => {
                if let Some(offset) = debounce.poll(Instant::now()) {
                    trace!("Scroll settled at offset {}", offset);
                    if output.send(offset).is_err() {
                        break;
                    }
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
