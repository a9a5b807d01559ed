//! Throttle: run an operation at most once per fixed interval.
//!
//! Integrations that front rate-limited cloud services share one throttle
//! between all their entities, so however often the host asks for fresh
//! state, the remote service sees at most one round-trip per interval.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// At-most-once-per-interval gate.
///
/// The window starts when an execution *finishes*. Calls made while an
/// execution is in flight are throttled rather than queued.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_run: Mutex<Option<Instant>>,
}

impl Throttle {
    /// Create a throttle that lets one execution through per `interval`.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: Mutex::new(None),
        }
    }

    /// Run `operation` unless it ran less than `interval` ago or is running now.
    ///
    /// Returns `None` when the call was throttled.
    pub async fn run<F, Fut, T>(&self, operation: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let Ok(mut last_run) = self.last_run.try_lock() else {
            tracing::trace!("throttled: execution already in flight");
            return None;
        };
        if last_run.is_some_and(|at| at.elapsed() < self.interval) {
            return None;
        }

        let output = operation().await;
        *last_run = Some(Instant::now());
        Some(output)
    }
}
