//! Session state machine states, start parameters, and diagnostics snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ResultId, SessionId, TestId};
use crate::violation::ViolationKind;

/// State of a monitoring session.
///
/// Transitions: `Idle → Acquiring → Active`, then `Active → Terminated`
/// (threshold crossed) or `Active/Acquiring → Stopped` (normal end).
/// `Terminated` and `Stopped` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No session running.
    Idle,

    /// Waiting on the sensor permission prompt and device handshake.
    Acquiring,

    /// Sampling in progress.
    Active,

    /// Violation threshold crossed; the attempt was forcibly ended.
    Terminated,

    /// The candidate submitted before the threshold was crossed.
    Stopped,
}

impl SessionState {
    /// Whether no further sampling or recording can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Terminated | SessionState::Stopped)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Acquiring => write!(f, "acquiring"),
            SessionState::Active => write!(f, "active"),
            SessionState::Terminated => write!(f, "terminated"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Parameters supplied by the test-taking collaborator when a session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionParams {
    /// Identifier for this monitoring session.
    pub session_id: SessionId,

    /// Test being taken.
    pub test_id: TestId,

    /// Result row of the attempt.
    pub result_id: ResultId,

    /// Overrides the configured violation threshold when set.
    pub max_violations: Option<u32>,
}

impl SessionParams {
    /// Create parameters with a freshly generated session ID.
    pub fn new(test_id: TestId, result_id: ResultId) -> Self {
        Self {
            session_id: SessionId::generate(),
            test_id,
            result_id,
            max_violations: None,
        }
    }

    /// Use a caller-supplied session ID.
    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    /// Override the violation threshold for this session.
    pub fn with_max_violations(mut self, max_violations: u32) -> Self {
        self.max_violations = Some(max_violations);
        self
    }
}

/// Point-in-time view of a session, for diagnostics and the termination hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session the snapshot describes.
    pub session_id: SessionId,

    /// Test being taken.
    pub test_id: TestId,

    /// Result row of the attempt.
    pub result_id: ResultId,

    /// Current state.
    pub state: SessionState,

    /// Violations recorded so far.
    pub violation_count: u32,

    /// Kind of the most recent violation, if any.
    pub last_violation: Option<ViolationKind>,

    /// When the session was created.
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(SessionState::Terminated.is_terminal());
        assert!(SessionState::Stopped.is_terminal());
        assert!(!SessionState::Idle.is_terminal());
        assert!(!SessionState::Acquiring.is_terminal());
        assert!(!SessionState::Active.is_terminal());
    }

    #[test]
    fn test_params_builder() {
        let params = SessionParams::new(TestId::generate(), ResultId::generate())
            .with_max_violations(3);
        assert_eq!(params.max_violations, Some(3));
    }
}
