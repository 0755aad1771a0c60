//! Error types for the proctor-monitor crate.

use proctor_types::SessionState;
use thiserror::Error;

/// Errors that can occur while monitoring a session.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Camera/microphone permission denied or device absent at acquisition
    /// time. Not retried automatically; the caller decides whether to block
    /// the test start.
    #[error("sensors unavailable: {reason}")]
    SensorUnavailable { reason: String },

    /// Reading a frame or spectrum from an acquired handle failed.
    #[error("sensor read failed: {reason}")]
    SensorRead { reason: String },

    /// Transient failure delivering a violation to the audit log. Recovered
    /// locally; never surfaced to the candidate.
    #[error("violation report delivery failed: {reason}")]
    ReportDeliveryFailed { reason: String },

    /// Operation attempted in the wrong session state.
    #[error("invalid session state: expected {expected}, found {actual}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    /// A monitoring session is already running on this controller.
    #[error("a monitoring session is already running")]
    SessionAlreadyRunning,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for monitoring operations.
pub type MonitorResult<T> = Result<T, MonitorError>;
