//! Violation ledger: the session state machine.
//!
//! Accumulates violation verdicts, keeps the count monotone, and flips the
//! session to `Terminated` exactly once when the threshold is crossed.
//! `Terminated` and `Stopped` are absorbing, which makes the race between a
//! late submit and an in-flight tick safe: whichever terminal state is
//! reached first wins and the other transition becomes a no-op.

use chrono::{DateTime, Utc};
use proctor_types::{
    ResultId, SessionId, SessionParams, SessionSnapshot, SessionState, TestId, Violation,
    ViolationKind,
};
use tracing::{debug, info, warn};

use crate::error::{MonitorError, MonitorResult};

/// Outcome of recording one verdict.
#[derive(Debug)]
pub enum RecordOutcome {
    /// Violation recorded; session still active.
    Recorded(Violation),

    /// Violation recorded and the threshold was crossed; the session is now
    /// terminated. Returned exactly once per session.
    ThresholdCrossed(Violation),

    /// Session is not active; nothing was recorded.
    Ignored,
}

/// In-memory state machine for one monitoring session.
pub struct ViolationLedger {
    session_id: SessionId,
    test_id: TestId,
    result_id: ResultId,

    /// Threshold at which the session terminates.
    max_violations: u32,

    state: SessionState,

    /// Monotonically non-decreasing within the session.
    violation_count: u32,

    /// Kind of the most recent violation, diagnostic only.
    last_violation: Option<ViolationKind>,

    /// Every recorded violation, in order.
    violations: Vec<Violation>,

    started_at: DateTime<Utc>,
}

impl ViolationLedger {
    /// Create a ledger in `Idle` for the given session parameters.
    pub fn new(params: &SessionParams, max_violations: u32) -> Self {
        Self {
            session_id: params.session_id.clone(),
            test_id: params.test_id.clone(),
            result_id: params.result_id.clone(),
            max_violations: params.max_violations.unwrap_or(max_violations),
            state: SessionState::Idle,
            violation_count: 0,
            last_violation: None,
            violations: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn violation_count(&self) -> u32 {
        self.violation_count
    }

    pub fn last_violation(&self) -> Option<ViolationKind> {
        self.last_violation
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            test_id: self.test_id.clone(),
            result_id: self.result_id.clone(),
            state: self.state,
            violation_count: self.violation_count,
            last_violation: self.last_violation,
            started_at: self.started_at,
        }
    }

    /// Move `Idle → Acquiring` when sensor acquisition begins.
    pub fn begin_acquiring(&mut self) -> MonitorResult<()> {
        if self.state != SessionState::Idle {
            return Err(MonitorError::InvalidState {
                expected: SessionState::Idle,
                actual: self.state,
            });
        }
        self.transition_to(SessionState::Acquiring);
        Ok(())
    }

    /// Move `Acquiring → Active` once sensors are held.
    pub fn activate(&mut self) -> MonitorResult<()> {
        if self.state != SessionState::Acquiring {
            return Err(MonitorError::InvalidState {
                expected: SessionState::Acquiring,
                actual: self.state,
            });
        }
        self.transition_to(SessionState::Active);
        Ok(())
    }

    /// Move `Acquiring → Idle` when acquisition fails; the session never
    /// reaches `Active`.
    pub fn acquisition_failed(&mut self) {
        if self.state == SessionState::Acquiring {
            self.transition_to(SessionState::Idle);
        }
    }

    /// Record one violation verdict.
    ///
    /// Only valid in `Active`; anything else is ignored, which covers ticks
    /// that were already scheduled when a terminal state landed.
    pub fn record(&mut self, kind: ViolationKind) -> RecordOutcome {
        if self.state != SessionState::Active {
            debug!(
                session_id = %self.session_id,
                state = %self.state,
                "Verdict ignored outside active state"
            );
            return RecordOutcome::Ignored;
        }

        let violation = Violation::new(
            kind,
            self.session_id.clone(),
            self.test_id.clone(),
            self.result_id.clone(),
        );
        self.violations.push(violation.clone());
        self.violation_count += 1;
        self.last_violation = Some(kind);

        info!(
            session_id = %self.session_id,
            kind = %kind,
            count = self.violation_count,
            max = self.max_violations,
            "Violation recorded"
        );

        if self.violation_count >= self.max_violations {
            warn!(
                session_id = %self.session_id,
                count = self.violation_count,
                "Violation threshold crossed; terminating session"
            );
            self.transition_to(SessionState::Terminated);
            return RecordOutcome::ThresholdCrossed(violation);
        }

        RecordOutcome::Recorded(violation)
    }

    /// End the session normally.
    ///
    /// Valid from `Active` or `Acquiring`; a no-op on terminal states.
    /// Returns whether a transition happened.
    pub fn stop(&mut self) -> bool {
        match self.state {
            SessionState::Active | SessionState::Acquiring => {
                self.transition_to(SessionState::Stopped);
                true
            }
            _ => false,
        }
    }

    fn transition_to(&mut self, new_state: SessionState) {
        info!(
            session_id = %self.session_id,
            old_state = %self.state,
            new_state = %new_state,
            "Session state transition"
        );
        self.state = new_state;
    }
}
