//! Convenient re-exports for common Tollgate types.
pub use crate::{
    clock::{Clock, SystemClock},
    fixed_window::{FixedWindowConfig, FixedWindowLimiter, WindowSnapshot},
    middleware::FixedWindowLayer,
    sleeper::{sleeper_fn, Sleeper, ThreadSleeper, TokioSleeper},
    LimiterError,
};
