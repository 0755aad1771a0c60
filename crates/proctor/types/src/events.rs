//! Session lifecycle events broadcast to UI and test-taking collaborators.

use serde::{Deserialize, Serialize};

use crate::session::SessionSnapshot;
use crate::violation::Violation;

/// Events emitted by the monitor controller over its broadcast channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MonitorEvent {
    /// A violation was recorded; `count` is the running total.
    ViolationRecorded { violation: Violation, count: u32 },

    /// The violation threshold was crossed and the session was forcibly
    /// terminated. Emitted at most once per session.
    SessionTerminated { snapshot: SessionSnapshot },

    /// The session ended normally before the threshold was crossed.
    SessionStopped { snapshot: SessionSnapshot },
}
