//! Per-sample violation heuristics.
//!
//! Both classifiers are intentionally coarse presence/noise proxies, not
//! detectors; the taxonomy in `proctor-types` documents the gap.

pub mod noise;
pub mod presence;

pub use noise::{Loudness, NoiseClassifier};
pub use presence::{Presence, PresenceClassifier};
