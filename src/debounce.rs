//! Cancellable delayed task: each `schedule` cancels the pending run and
//! starts a fresh quiet period, so a burst of triggers yields one run.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

pub struct Debouncer {
    name: &'static str,
    delay: Duration,
    current_token: Mutex<CancellationToken>,
    generation: AtomicU64,
    tracker: TaskTracker,
}

impl Debouncer {
    /// Runs are spawned on `tracker` so owners can wait for them.
    pub fn new(name: &'static str, delay: Duration, tracker: TaskTracker) -> Self {
        Self {
            name,
            delay,
            current_token: Mutex::new(CancellationToken::new()),
            generation: AtomicU64::new(0),
            tracker,
        }
    }

    /// Cancel any pending run and schedule `action` after the quiet period.
    /// `action` is only constructed if the period elapses uncancelled.
    /// Returns the generation of the new run.
    pub fn schedule<F, Fut>(&self, action: F) -> u64
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = {
            let mut guard = self.current_token.lock();
            guard.cancel();
            *guard = CancellationToken::new();
            guard.clone()
        };
        let gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.delay;
        let name = self.name;

        self.tracker.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    debug!(debounce = name, generation = gen, "debounce fired");
                    action().await;
                }
                _ = token.cancelled() => {
                    debug!(debounce = name, generation = gen, "debounce superseded");
                }
            }
        });
        gen
    }

    /// Cancel the pending run, if any.
    pub fn cancel(&self) {
        self.current_token.lock().cancel();
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
