#![deny(unsafe_code)]
//! # proctor-types
//!
//! Shared types for the assessment integrity monitor: strongly-typed
//! identifiers, the violation taxonomy, the session state machine states,
//! and the raw sensor sample carriers.
//!
//! These types carry no behavior beyond construction, inspection, and
//! serialization; the monitoring logic lives in `proctor-monitor`.

pub mod events;
pub mod ids;
pub mod sensor;
pub mod session;
pub mod violation;

pub use events::MonitorEvent;
pub use ids::{ResultId, SessionId, TestId};
pub use sensor::{AudioSpectrum, VideoFrame};
pub use session::{SessionParams, SessionSnapshot, SessionState};
pub use violation::{AuditRecord, Violation, ViolationKind};
