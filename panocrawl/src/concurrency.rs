//! Bounded concurrency for network fan-outs.
//!
//! Every fan-out in the crawler (coverage scan, panorama processing, per-assembly
//! tile fetch) owns its own [`ConcurrencyLimiter`], so a slow stage never
//! consumes capacity belonging to another.
//!
//! [`run_bounded`] drives a work list through a limiter, spawning a task only
//! once a permit is in hand. The number of spawned tasks therefore never
//! exceeds the limit, even for very large work lists.
//!
//! # Usage
//!
//! ```ignore
//! let limiter = ConcurrencyLimiter::new(100, "coverage");
//! run_bounded(&limiter, tiles, |tile| scan_one(tile), |result| merge(result)).await;
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::warn;

/// Semaphore-based limiter on concurrent operations.
///
/// Tracks in-flight and peak counts for diagnostics.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    /// Semaphore controlling concurrent operations
    semaphore: Arc<Semaphore>,

    /// Maximum permits (for stats/debugging)
    max_permits: usize,

    /// Current number of in-flight operations
    in_flight: Arc<AtomicUsize>,

    /// Peak concurrent operations observed
    peak_in_flight: AtomicUsize,

    /// Label for this limiter (e.g., "coverage", "tiles")
    label: String,
}

impl ConcurrencyLimiter {
    /// Creates a new limiter with the specified maximum concurrent operations.
    ///
    /// A limit of zero is raised to one.
    pub fn new(max_concurrent: usize, label: impl Into<String>) -> Self {
        let max_concurrent = max_concurrent.max(1);

        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_permits: max_concurrent,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: AtomicUsize::new(0),
            label: label.into(),
        }
    }

    /// Acquires a permit, waiting until one is available.
    ///
    /// Returns `None` only if the limiter has been closed.
    pub async fn acquire(&self) -> Option<ConcurrencyPermit> {
        let permit = self.semaphore.clone().acquire_owned().await.ok()?;
        Some(self.track(permit))
    }

    /// Tries to acquire a permit without waiting.
    ///
    /// Returns `None` if no permits are available.
    pub fn try_acquire(&self) -> Option<ConcurrencyPermit> {
        let permit = self.semaphore.clone().try_acquire_owned().ok()?;
        Some(self.track(permit))
    }

    fn track(&self, permit: OwnedSemaphorePermit) -> ConcurrencyPermit {
        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.update_peak(current);

        ConcurrencyPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Updates the peak counter if current exceeds it.
    fn update_peak(&self, current: usize) {
        let mut peak = self.peak_in_flight.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_in_flight.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    /// Returns the label for this limiter.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the maximum number of concurrent operations allowed.
    pub fn max_concurrent(&self) -> usize {
        self.max_permits
    }

    /// Returns the current number of in-flight operations.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Returns the peak number of concurrent operations observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    /// Returns the number of available permits.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// A permit for performing a concurrent operation.
///
/// Owned, so it can move into a spawned task. Released on drop.
#[derive(Debug)]
pub struct ConcurrencyPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for ConcurrencyPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Runs `task` for every item with at most `limiter.max_concurrent()` in flight.
///
/// Completions are handed to `on_complete` in whatever order they finish.
/// A task that panics is reported as `Err(JoinError)` and does not stop the
/// remaining work.
pub async fn run_bounded<I, F, Fut, T, C>(
    limiter: &ConcurrencyLimiter,
    items: I,
    mut task: F,
    mut on_complete: C,
) where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
    C: FnMut(Result<T, JoinError>),
{
    let mut pending = items.into_iter().peekable();
    let mut running: JoinSet<T> = JoinSet::new();

    loop {
        // Spawn as many tasks as there are free permits
        while pending.peek().is_some() {
            let Some(permit) = limiter.try_acquire() else {
                break;
            };
            let Some(item) = pending.next() else {
                break;
            };
            let work = task(item);
            running.spawn(async move {
                let _permit = permit;
                work.await
            });
        }

        if let Some(result) = running.join_next().await {
            if let Err(ref e) = result {
                warn!(limiter = limiter.label(), error = %e, "Bounded task failed to complete");
            }
            on_complete(result);
        } else if pending.peek().is_some() {
            // Nothing of ours is running but every permit is held elsewhere
            let Some(permit) = limiter.acquire().await else {
                warn!(limiter = limiter.label(), "Limiter closed with work pending");
                break;
            };
            if let Some(item) = pending.next() {
                let work = task(item);
                running.spawn(async move {
                    let _permit = permit;
                    work.await
                });
            }
        } else {
            break;
        }
    }
}
