//! Monitoring configuration.
//!
//! Defines the sampling cadence, the violation threshold, and the classifier
//! thresholds, with named presets for stricter or more lenient proctoring.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, MonitorResult};

/// Configuration for the monitoring loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Interval between sampling ticks.
    pub sample_interval: Duration,

    /// Violations tolerated before the session is terminated. Sessions may
    /// override this per attempt.
    pub max_violations: u32,

    /// Presence classifier settings.
    pub presence: PresenceConfig,

    /// Noise classifier settings.
    pub noise: NoiseConfig,

    /// Audio analysis node settings, fixed at acquisition time.
    pub audio: AudioAnalysisConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(1500),
            max_violations: 10,
            presence: PresenceConfig::default(),
            noise: NoiseConfig::default(),
            audio: AudioAnalysisConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Preset for high-stakes assessments: tighter threshold, faster cadence.
    pub fn strict() -> Self {
        let mut config = Self::default();
        config.max_violations = 5;
        config.sample_interval = Duration::from_millis(1000);
        config.noise.loudness_threshold = 30.0;
        config
    }

    /// Preset for low-stakes practice runs: slower cadence, higher tolerance.
    pub fn lenient() -> Self {
        let mut config = Self::default();
        config.max_violations = 20;
        config.sample_interval = Duration::from_millis(3000);
        config.noise.loudness_threshold = 60.0;
        config
    }

    /// Validate invariants that the rest of the crate relies on.
    pub fn validate(&self) -> MonitorResult<()> {
        if self.sample_interval.is_zero() {
            return Err(MonitorError::Configuration(
                "sample_interval must be positive".into(),
            ));
        }
        if self.max_violations == 0 {
            return Err(MonitorError::Configuration(
                "max_violations must be at least 1".into(),
            ));
        }
        self.presence.validate()?;
        Ok(())
    }
}

/// Presence classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Minimum fraction of skin-tone pixels for a face to be plausible.
    /// Frames below this have no visible face-colored region.
    pub min_skin_fraction: f64,

    /// Maximum fraction of skin-tone pixels. Frames above this are dominated
    /// by a single skin-toned surface (camera blocked by a hand,
    /// miscalibrated light).
    pub max_skin_fraction: f64,

    /// Pixel stride used when downsampling the frame.
    pub sample_stride: u32,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            min_skin_fraction: 0.05,
            max_skin_fraction: 0.50,
            sample_stride: 4,
        }
    }
}

impl PresenceConfig {
    fn validate(&self) -> MonitorResult<()> {
        if self.min_skin_fraction >= self.max_skin_fraction {
            return Err(MonitorError::Configuration(
                "min_skin_fraction must be below max_skin_fraction".into(),
            ));
        }
        if self.sample_stride == 0 {
            return Err(MonitorError::Configuration(
                "sample_stride must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Noise classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Mean bin magnitude (0-255 scale) above which a tick counts as loud.
    pub loudness_threshold: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            loudness_threshold: 40.0,
        }
    }
}

/// Audio analysis node settings.
///
/// Built once at acquisition time and reused by every tick; recreating the
/// node per tick is wasteful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioAnalysisConfig {
    /// Analysis window size in samples.
    pub fft_size: u32,

    /// Smoothing constant applied by the node across reads.
    pub smoothing: f64,
}

impl Default for AudioAnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing: 0.3,
        }
    }
}
