//! Fixed-window limiter.
//!
//! Time is cut into windows of `window` length aligned to the Unix epoch. Up to `capacity`
//! units are admitted per window. A caller whose reservation does not fit waits until the
//! next aligned window opens; callers are delayed, never rejected. The first call in a later
//! window resets the counter, so a caller returning from a wait does not count against the
//! window it wakes up in.
//!
//! The internal mutex is held only while the counters are read and updated. The wait
//! itself runs outside the critical section, so concurrent callers that overflow a window
//! each compute their own delay to the same boundary instead of serializing through one
//! another's sleeps.
//!
//! ```rust
//! use std::time::Duration;
//! use tollgate::FixedWindowLimiter;
//!
//! #[tokio::main]
//! async fn main() {
//!     // 5 calls per second
//!     let limiter = FixedWindowLimiter::with_window(5, Duration::from_secs(1)).unwrap();
//!     for _ in 0..5 {
//!         limiter.acquire().await; // no waiting inside the first window
//!     }
//!     assert!(limiter.snapshot().count <= 5);
//! }
//! ```

use crate::clock::{Clock, SystemClock};
use crate::sleeper::{Sleeper, TokioSleeper};
use crate::LimiterError;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Window length used when none is given.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Validated limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedWindowConfig {
    capacity: u32,
    #[cfg_attr(feature = "serde", serde(default = "default_window"))]
    window: Duration,
}

#[cfg(feature = "serde")]
fn default_window() -> Duration {
    DEFAULT_WINDOW
}

impl FixedWindowConfig {
    /// Create a config with validation. Errors if `capacity` or `window` is zero.
    pub fn new(capacity: u32, window: Duration) -> Result<Self, LimiterError> {
        let cfg = Self { capacity, window };
        cfg.validate()?;
        Ok(cfg)
    }

    /// `capacity` units per one-minute window.
    pub fn per_minute(capacity: u32) -> Result<Self, LimiterError> {
        Self::new(capacity, DEFAULT_WINDOW)
    }

    /// Units admitted per window.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Length of one window.
    pub fn window(&self) -> Duration {
        self.window
    }

    fn validate(&self) -> Result<(), LimiterError> {
        if self.capacity == 0 {
            return Err(LimiterError::InvalidCapacity { provided: self.capacity });
        }
        if self.window.is_zero() {
            return Err(LimiterError::InvalidWindow(self.window));
        }
        Ok(())
    }

    fn window_index(&self, at: Duration) -> u128 {
        at.as_nanos() / self.window.as_nanos()
    }

    fn window_start(&self, at: Duration) -> Duration {
        let nanos = self.window_index(at) * self.window.as_nanos();
        Duration::new((nanos / NANOS_PER_SEC) as u64, (nanos % NANOS_PER_SEC) as u32)
    }
}

#[derive(Debug, Default)]
struct WindowState {
    /// `None` until the first acquisition.
    anchor: Option<Duration>,
    count: u32,
}

/// Point-in-time view of a limiter's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub capacity: u32,
    pub window: Duration,
    /// Timestamp (since the Unix epoch) inside the tracked window, `None` before first use.
    pub anchor: Option<Duration>,
    /// Units admitted in the tracked window.
    pub count: u32,
}

impl WindowSnapshot {
    pub fn is_initialized(&self) -> bool {
        self.anchor.is_some()
    }

    /// Units still free in the tracked window.
    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.count)
    }
}

/// Fixed-window limiter shared by reference (or `Arc`) among callers.
///
/// Deliberately not `Clone`: a copy would carry its own counters.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    config: FixedWindowConfig,
    state: Mutex<WindowState>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    /// `capacity` units per minute, waiting on the tokio timer.
    pub fn new(capacity: u32) -> Result<Self, LimiterError> {
        Self::with_config(FixedWindowConfig::per_minute(capacity)?)
    }

    /// `capacity` units per `window`, waiting on the tokio timer.
    pub fn with_window(capacity: u32, window: Duration) -> Result<Self, LimiterError> {
        Self::with_config(FixedWindowConfig::new(capacity, window)?)
    }

    /// `capacity` units per `window`, waiting through `sleeper`.
    pub fn with_sleeper<S: Sleeper + 'static>(
        capacity: u32,
        window: Duration,
        sleeper: S,
    ) -> Result<Self, LimiterError> {
        Ok(Self::with_window(capacity, window)?.with_wait_strategy(sleeper))
    }

    /// Create a limiter from an explicit config. The config is validated again, since a
    /// deserialized config bypasses [`FixedWindowConfig::new`].
    pub fn with_config(config: FixedWindowConfig) -> Result<Self, LimiterError> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(WindowState::default()),
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn builder() -> FixedWindowLimiterBuilder {
        FixedWindowLimiterBuilder::new()
    }

    /// Override the clock (useful for deterministic tests).
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Override the wait strategy.
    pub fn with_wait_strategy<S: Sleeper + 'static>(mut self, sleeper: S) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn capacity(&self) -> u32 {
        self.config.capacity
    }

    pub fn window(&self) -> Duration {
        self.config.window
    }

    pub fn config(&self) -> &FixedWindowConfig {
        &self.config
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        let state = self.lock_state();
        WindowSnapshot {
            capacity: self.config.capacity,
            window: self.config.window,
            anchor: state.anchor,
            count: state.count,
        }
    }

    /// Reserve one unit, waiting for the next window if the current one is full.
    pub async fn acquire(&self) {
        let wait = self.reserve(1);
        self.wait_out(1, wait).await;
    }

    /// Reserve `units`, waiting for the next window if they do not fit in the current one.
    ///
    /// # Errors
    /// Returns `LimiterError::InvalidReservation` if `units` is zero.
    pub async fn acquire_n(&self, units: u32) -> Result<(), LimiterError> {
        let wait = self.reserve_n(units)?;
        self.wait_out(units, wait).await;
        Ok(())
    }

    /// Run the admission decision for `units` without waiting and return how long the
    /// caller owes before proceeding (`Duration::ZERO` if admitted right away). The delay
    /// never reaches past the next window boundary.
    pub fn reserve_n(&self, units: u32) -> Result<Duration, LimiterError> {
        if units == 0 {
            return Err(LimiterError::InvalidReservation { provided: units });
        }
        Ok(self.reserve(units))
    }

    /// Blocking form of [`acquire`](Self::acquire) for threads outside an async runtime.
    /// Waits through [`Sleeper::sleep_blocking`], so the default tokio sleeper falls back to
    /// parking the thread.
    pub fn acquire_blocking(&self) {
        let wait = self.reserve(1);
        self.wait_out_blocking(1, wait);
    }

    /// Blocking form of [`acquire_n`](Self::acquire_n).
    pub fn acquire_n_blocking(&self, units: u32) -> Result<(), LimiterError> {
        let wait = self.reserve_n(units)?;
        self.wait_out_blocking(units, wait);
        Ok(())
    }

    fn reserve(&self, units: u32) -> Duration {
        let mut state = self.lock_state();
        let now = self.clock.now();
        self.charge(&mut state, now, units)
    }

    fn charge(&self, state: &mut WindowState, now: Duration, units: u32) -> Duration {
        match state.anchor {
            Some(anchor) if self.config.window_index(now) <= self.config.window_index(anchor) => {}
            previous => {
                if previous.is_some() {
                    tracing::trace!(
                        target: "tollgate::fixed_window",
                        units,
                        "window rolled over"
                    );
                }
                state.anchor = Some(now);
                state.count = units;
                return Duration::ZERO;
            }
        }

        let fits = state
            .count
            .checked_add(units)
            .is_some_and(|total| total <= self.config.capacity);
        if fits {
            state.count += units;
            return Duration::ZERO;
        }

        // Window is full: sit out the rest of it. The anchor stays put so the first call in
        // the next window resets the counter.
        let next_start = self.config.window_start(now).saturating_add(self.config.window);
        next_start.saturating_sub(now)
    }

    async fn wait_out(&self, units: u32, wait: Duration) {
        if self.trace_wait(units, wait) {
            self.sleeper.sleep(wait).await;
        }
    }

    fn wait_out_blocking(&self, units: u32, wait: Duration) {
        if self.trace_wait(units, wait) {
            self.sleeper.sleep_blocking(wait);
        }
    }

    fn trace_wait(&self, units: u32, wait: Duration) -> bool {
        if wait.is_zero() {
            return false;
        }
        tracing::debug!(
            target: "tollgate::fixed_window",
            ?wait,
            reserved = units,
            capacity = self.config.capacity,
            "window full; waiting for next window"
        );
        true
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, WindowState> {
        // Every mutation completes before the guard drops, so a poisoned state is still valid.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builder for [`FixedWindowLimiter`]. Capacity must be set; everything else has defaults.
#[derive(Debug)]
pub struct FixedWindowLimiterBuilder {
    capacity: u32,
    window: Duration,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
}

impl Default for FixedWindowLimiterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedWindowLimiterBuilder {
    pub fn new() -> Self {
        Self {
            capacity: 0,
            window: DEFAULT_WINDOW,
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(SystemClock),
        }
    }

    /// Units admitted per window. Must be > 0.
    pub fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Window length. Must be > 0.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn sleeper<S: Sleeper + 'static>(mut self, sleeper: S) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn build(self) -> Result<FixedWindowLimiter, LimiterError> {
        let config = FixedWindowConfig::new(self.capacity, self.window)?;
        Ok(FixedWindowLimiter {
            config,
            state: Mutex::new(WindowState::default()),
            sleeper: self.sleeper,
            clock: self.clock,
        })
    }
}
