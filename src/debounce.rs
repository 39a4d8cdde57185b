//! Cancellable delayed publication of a changing value.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::PhraseError;

/// Publishes a value only after it has stopped changing for `window`.
///
/// Every [`push`](Debouncer::push) aborts the task scheduled by the previous
/// one and schedules a new task, so a burst of updates settles on the last
/// value only. Settled values are readable with [`settled`](Debouncer::settled)
/// or observable through [`subscribe`](Debouncer::subscribe).
pub struct Debouncer<T> {
    window: Duration,
    runtime: Handle,
    pending: Option<JoinHandle<()>>,
    publisher: Arc<watch::Sender<T>>,
    settled: watch::Receiver<T>,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a debouncer on the current Tokio runtime.
    pub fn new(initial: T, window: Duration) -> Result<Self, PhraseError> {
        let runtime = Handle::try_current().map_err(|e| PhraseError::Runtime(e.to_string()))?;
        Ok(Self::with_handle(initial, window, runtime))
    }

    /// Creates a debouncer that schedules its timers on `runtime`.
    pub fn with_handle(initial: T, window: Duration, runtime: Handle) -> Self {
        let (publisher, settled) = watch::channel(initial);
        Self {
            window,
            runtime,
            pending: None,
            publisher: Arc::new(publisher),
            settled,
        }
    }

    /// Schedules `value` for publication, discarding any value still pending.
    pub fn push(&mut self, value: T) {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }

        let publisher = Arc::clone(&self.publisher);
        let window = self.window;
        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(window).await;
            publisher.send_replace(value);
        }));
    }

    /// Publishes `value` immediately, cancelling anything pending.
    pub fn flush(&mut self, value: T) {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }
        self.publisher.send_replace(value);
    }

    /// Last settled value.
    pub fn settled(&self) -> T {
        self.settled.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.publisher.subscribe()
    }

    /// Whether a pushed value is still waiting out its window.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(task) = self.pending.take() {
            if !task.is_finished() {
                debug!("Dropping debouncer with a pending update");
            }
            task.abort();
        }
    }
}
