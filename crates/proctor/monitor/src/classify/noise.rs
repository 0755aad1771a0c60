//! Ambient-noise heuristic.
//!
//! Reads the frequency-magnitude buffer produced by the shared analysis node
//! and compares the mean magnitude against a fixed threshold. No smoothing
//! is applied across ticks beyond what the node itself provides; a single
//! loud tick is enough to register a violation.

use proctor_types::AudioSpectrum;
use tracing::trace;

use crate::config::NoiseConfig;

/// Verdict of the noise classifier for one analysis window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Loudness {
    Quiet,
    Loud,
}

/// Classifies analysis windows by mean bin magnitude.
pub struct NoiseClassifier {
    config: NoiseConfig,
}

impl NoiseClassifier {
    pub fn new(config: NoiseConfig) -> Self {
        Self { config }
    }

    /// Classify one analysis window.
    pub fn classify(&self, spectrum: &AudioSpectrum) -> Loudness {
        let mean = spectrum.mean_magnitude();
        trace!(mean, "Noise sample");

        if mean > self.config.loudness_threshold {
            Loudness::Loud
        } else {
            Loudness::Quiet
        }
    }
}
