//! Violation events and the audit-log wire record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ResultId, SessionId, TestId};

/// Categories of integrity violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// No face-like region was visible in the sampled frame.
    NoFacePresent,
    /// Ambient sound exceeded the loudness threshold.
    LoudAmbientNoise,
    /// More than one face in frame. Part of the audit-log schema, but the
    /// presence heuristic cannot distinguish one face from several, so no
    /// classifier currently emits this kind.
    MultipleFacesPresent,
}

impl ViolationKind {
    /// Stable string form used in logs and the audit payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoFacePresent => "no_face_present",
            Self::LoudAmbientNoise => "loud_ambient_noise",
            Self::MultipleFacesPresent => "multiple_faces_present",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected monitoring-rule breach, immutable once created.
///
/// Correlation identifiers are copied in at emission time so the event is
/// self-describing wherever it ends up.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Violation {
    /// Category of the breach.
    pub kind: ViolationKind,

    /// When the violation was recorded.
    pub timestamp: DateTime<Utc>,

    /// Monitoring session the violation belongs to.
    pub session_id: SessionId,

    /// Test being taken.
    pub test_id: TestId,

    /// Result row of the attempt.
    pub result_id: ResultId,
}

impl Violation {
    pub fn new(
        kind: ViolationKind,
        session_id: SessionId,
        test_id: TestId,
        result_id: ResultId,
    ) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            session_id,
            test_id,
            result_id,
        }
    }

    /// The outbound audit-log record for this violation.
    pub fn audit_record(&self) -> AuditRecord {
        AuditRecord {
            test_id: self.test_id.clone(),
            result_id: self.result_id.clone(),
            violation_type: self.kind,
        }
    }
}

/// Wire payload sent to the proctoring-log collaborator, one per violation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRecord {
    pub test_id: TestId,
    pub result_id: ResultId,
    pub violation_type: ViolationKind,
}
