#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Tollgate
//!
//! A fixed-window rate limiter for keeping outbound call rates under an external cap.
//!
//! Time is divided into windows aligned to multiples of the window length since the Unix
//! epoch. Up to `capacity` units are admitted per window; the caller that would exceed the
//! limit is not rejected but waits until the next window opens.
//!
//! ## Features
//!
//! - **Aligned windows**: every limiter with the same window length rolls over together
//! - **Pluggable wait strategy** via [`Sleeper`] (tokio timer by default, thread sleep for
//!   blocking callers, closures via [`sleeper_fn`])
//! - **Injectable clock** via [`Clock`] for deterministic tests
//! - **Tower middleware** ([`FixedWindowLayer`]) for pacing a client stack
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use tollgate::FixedWindowLimiter;
//!
//! #[tokio::main]
//! async fn main() {
//!     // 60 calls per minute
//!     let limiter = FixedWindowLimiter::new(60).unwrap();
//!     limiter.acquire().await;
//!
//!     // Batch calls reserve several units at once
//!     limiter.acquire_n(10).await.unwrap();
//!     assert_eq!(limiter.window(), Duration::from_secs(60));
//! }
//! ```

pub mod clock;
pub mod error;
pub mod fixed_window;
pub mod middleware;
pub mod prelude;
pub mod sleeper;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::LimiterError;
pub use fixed_window::{
    FixedWindowConfig, FixedWindowLimiter, FixedWindowLimiterBuilder, WindowSnapshot,
    DEFAULT_WINDOW,
};
pub use middleware::{FixedWindowLayer, FixedWindowService};
pub use sleeper::{
    sleeper_fn, FnSleeper, InstantSleeper, SleepFuture, Sleeper, ThreadSleeper, TokioSleeper,
    TrackingSleeper,
};
