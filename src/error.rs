//! Error taxonomy for simulation runs.
//!
//! Only invalid input is an error. Routing problems, an empty driver pool and
//! exhausted capacity are expected outcomes and are reported as data through
//! [`UnassignedReason`](crate::assignment::UnassignedReason).

use thiserror::Error;

/// Fatal input errors. A run that returns one of these computed nothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// `maxHoursPerDay` outside `(0, 24]`.
    #[error("maxHoursPerDay must be in (0, 24], got {0}")]
    InvalidCapacity(f64),

    /// `availableDrivers` below one.
    #[error("availableDrivers must be at least 1, got {0}")]
    InvalidDriverCount(i64),

    /// `startTime` that is not a time of day.
    #[error("startTime must be HH:MM, got {0:?}")]
    InvalidStartTime(String),

    /// A fleet record that breaks its own invariants.
    #[error("invalid {kind} {id:?}: {reason}")]
    InvalidRecord {
        kind: &'static str,
        id: String,
        reason: String,
    },

    /// A policy whose constants are out of range.
    #[error("invalid simulation policy: {0}")]
    InvalidPolicy(String),
}

impl SimulationError {
    /// Stable machine-readable code for API responses.
    ///
    /// ```
    /// use fleet_simulation::error::SimulationError;
    ///
    /// assert_eq!(SimulationError::InvalidCapacity(0.0).code(), "INVALID_CAPACITY");
    /// ```
    pub fn code(&self) -> &'static str {
        match self {
            SimulationError::InvalidCapacity(_) => "INVALID_CAPACITY",
            SimulationError::InvalidDriverCount(_) => "INVALID_DRIVER_COUNT",
            SimulationError::InvalidStartTime(_) => "INVALID_START_TIME",
            SimulationError::InvalidRecord { .. } => "INVALID_RECORD",
            SimulationError::InvalidPolicy(_) => "INVALID_POLICY",
        }
    }

    pub(crate) fn record(kind: &'static str, id: &str, reason: impl Into<String>) -> Self {
        SimulationError::InvalidRecord {
            kind,
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
