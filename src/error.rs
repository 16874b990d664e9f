//! Error types for limiter configuration and reservations
use std::time::Duration;

/// Errors returned when a limiter is misconfigured or misused.
///
/// Nothing is returned mid-wait: a call either fails up front or eventually succeeds.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LimiterError {
    /// Capacity must be at least one unit per window.
    #[error("capacity must be > 0 (got {provided})")]
    InvalidCapacity {
        /// Value provided by caller.
        provided: u32,
    },
    /// Window length must be non-zero.
    #[error("window must be > 0 (got {0:?})")]
    InvalidWindow(Duration),
    /// A reservation must consume at least one unit.
    #[error("reservation must be > 0 units (got {provided})")]
    InvalidReservation {
        /// Value provided by caller.
        provided: u32,
    },
}

impl LimiterError {
    /// Check if this error came from validating capacity or window at setup time.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidCapacity { .. } | Self::InvalidWindow(_))
    }

    /// Check if this error came from an empty reservation.
    pub fn is_invalid_reservation(&self) -> bool {
        matches!(self, Self::InvalidReservation { .. })
    }
}
