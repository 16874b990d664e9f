//! Wait strategies invoked when a caller has to sit out the rest of a window.
//!
//! The limiter computes how long a caller owes and hands that duration to a [`Sleeper`].
//! The default is [`TokioSleeper`], which parks the thread when driven through the
//! limiter's blocking entry points. Tests use [`InstantSleeper`] or [`TrackingSleeper`] to
//! avoid real delays.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Future returned by a [`Sleeper`].
pub type SleepFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Abstraction for waiting out a computed delay.
pub trait Sleeper: Send + Sync + fmt::Debug {
    fn sleep(&self, duration: Duration) -> SleepFuture;

    /// Wait from a thread that is not driving an async runtime.
    ///
    /// Defaults to blocking on [`sleep`](Self::sleep); implementations whose future needs a
    /// runtime override it.
    fn sleep_blocking(&self, duration: Duration) {
        futures::executor::block_on(self.sleep(duration));
    }
}

/// Suspends the calling task on the tokio timer. Blocking callers park the thread instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture {
        Box::pin(tokio::time::sleep(duration))
    }

    fn sleep_blocking(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Blocks the calling OS thread for the full duration, from async callers too.
///
/// Inside an async runtime this stalls a worker thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture {
        std::thread::sleep(duration);
        Box::pin(std::future::ready(()))
    }

    fn sleep_blocking(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Test sleeper that doesn't actually sleep
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> SleepFuture {
        Box::pin(std::future::ready(()))
    }
}

/// Test sleeper that records every requested delay and returns immediately.
#[derive(Debug, Clone, Default)]
pub struct TrackingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl TrackingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Sum of every recorded delay.
    pub fn total(&self) -> Duration {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).iter().sum()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(duration);
        Box::pin(std::future::ready(()))
    }
}

/// Adapts a closure into a [`Sleeper`]. Build one with [`sleeper_fn`].
#[derive(Clone)]
pub struct FnSleeper<F> {
    f: F,
}

impl<F> fmt::Debug for FnSleeper<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSleeper").finish_non_exhaustive()
    }
}

impl<F, Fut> Sleeper for FnSleeper<F>
where
    F: Fn(Duration) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn sleep(&self, duration: Duration) -> SleepFuture {
        Box::pin((self.f)(duration))
    }
}

/// Use a closure as the wait strategy.
///
/// ```
/// use std::time::Duration;
/// use tollgate::{sleeper_fn, FixedWindowLimiter};
///
/// let limiter = FixedWindowLimiter::with_sleeper(
///     10,
///     Duration::from_secs(1),
///     sleeper_fn(|wait| async move {
///         eprintln!("backing off for {wait:?}");
///         tokio::time::sleep(wait).await;
///     }),
/// )
/// .unwrap();
/// assert_eq!(limiter.capacity(), 10);
/// ```
pub fn sleeper_fn<F, Fut>(f: F) -> FnSleeper<F>
where
    F: Fn(Duration) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    FnSleeper { f }
}
