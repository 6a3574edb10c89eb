//! Error types for judgement-sched.
//!
//! Capacity and load conditions (queue full, backpressure drop/degrade) are
//! not errors here; they are counted outcomes surfaced through statistics
//! and the pressure signal. Errors are reserved for integration bugs and
//! for talking to a scheduler that has already stopped.

use thiserror::Error;

use judgement_core::CoreError;

/// Result alias for judgement-sched operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Unified error type for the adaptive scheduler.
#[derive(Debug, Error)]
pub enum SchedError {
    /// A rhythm configuration was malformed.
    #[error("invalid rhythm config: {message}")]
    InvalidRhythm {
        /// Description of the violation
        message: String,
    },

    /// A configuration value failed validation.
    #[error("invalid scheduler configuration: {message}")]
    InvalidConfig {
        /// Description of the violation
        message: String,
    },

    /// An event was submitted after the scheduler stopped.
    #[error("scheduler has stopped")]
    SchedulerStopped,

    /// A core-level failure surfaced during dispatch.
    #[error(transparent)]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_converts() {
        let err: SchedError = CoreError::EmptyVector.into();
        assert!(matches!(err, SchedError::Core(CoreError::EmptyVector)));
    }

    #[test]
    fn test_display_messages() {
        let err = SchedError::InvalidRhythm {
            message: "cycle must be > 0".to_string(),
        };
        assert!(err.to_string().contains("cycle"));
        assert_eq!(
            SchedError::SchedulerStopped.to_string(),
            "scheduler has stopped"
        );
    }
}
