#![deny(unsafe_code)]
//! # proctor-monitor
//!
//! Integrity-monitoring loop for timed assessment sessions.
//!
//! A session samples the candidate's camera and microphone on a fixed
//! cadence, classifies each sample with coarse presence/noise heuristics,
//! accumulates violations in a bounded ledger, and forcibly terminates the
//! attempt once the threshold is crossed. Data flow:
//!
//! [`MonitorController`] acquires a [`SensorStream`] → the [`Sampler`] ticks
//! every period → presence and noise classifiers evaluate the current frame
//! and analysis window → at most one verdict per tick reaches the
//! [`ViolationLedger`] → each recorded violation is reported fire-and-forget
//! through a [`ViolationReporter`] → crossing the threshold terminates the
//! session and notifies the test-taking collaborator exactly once.
//!
//! The loop is cooperative and timer-driven; reporting never blocks a tick,
//! and sensor or transport failures never corrupt session state.

pub mod classify;
pub mod config;
pub mod controller;
pub mod error;
pub mod ledger;
pub mod reporter;
pub mod sampler;
pub mod sensor;
pub mod testing;

pub use classify::{Loudness, NoiseClassifier, Presence, PresenceClassifier};
pub use config::{AudioAnalysisConfig, MonitorConfig, NoiseConfig, PresenceConfig};
pub use controller::{MonitorController, SessionHooks};
pub use error::{MonitorError, MonitorResult};
pub use ledger::{RecordOutcome, ViolationLedger};
pub use reporter::{HttpAuditReporter, ViolationReporter};
pub use sampler::{Sampler, TickOutcome};
pub use sensor::{SensorGuard, SensorHandle, SensorStream};
