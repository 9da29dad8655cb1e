use thiserror::Error;

use crate::config::Profile;

/// Errors that can occur while running the sensor emulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    /// An edit event named a field or command the parameter store does not know
    #[error("unrecognized control command: {command}")]
    InvalidEdit {
        /// The offending command token or key
        command: String,
    },

    /// The sink rejected or failed to deliver a notification
    #[error("failed to deliver {profile} notification: {reason}")]
    Delivery {
        /// Profile whose record was dropped
        profile: Profile,
        /// Sink-reported failure reason
        reason: String,
    },

    /// The startup capability selection could not be resolved
    #[error("invalid capability selection: {0}")]
    InvalidCapabilities(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, SimulatorError>;

impl SimulatorError {
    /// Check if this error is a dropped notification
    ///
    /// Delivery failures are absorbed by the scheduler: the record is lost
    /// and the next tick supersedes it.
    #[must_use]
    pub const fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery { .. })
    }

    /// Check if this error can only occur at startup
    ///
    /// Everything the running core raises is survivable; only a capability
    /// selection that resolves to no profile prevents the simulator from
    /// being constructed at all.
    #[must_use]
    pub const fn is_startup_error(&self) -> bool {
        matches!(self, Self::InvalidCapabilities(_))
    }
}
