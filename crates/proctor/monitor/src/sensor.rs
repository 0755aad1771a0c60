//! Sensor acquisition and release.
//!
//! The controller is handed an injectable [`SensorStream`] capability object
//! rather than reaching for ambient device state, so tests can substitute a
//! scripted source. The acquired [`SensorHandle`] owns the camera and
//! microphone tracks plus the frequency-analysis node for the whole session.

use async_trait::async_trait;
use proctor_types::{AudioSpectrum, VideoFrame};
use tracing::debug;

use crate::config::AudioAnalysisConfig;
use crate::error::MonitorResult;

/// Source of camera/microphone capture for a session.
#[async_trait]
pub trait SensorStream: Send + Sync {
    /// Request combined video+audio capture, once per session.
    ///
    /// The analysis node is built here with the given settings and reused by
    /// every tick. Fails with [`MonitorError::SensorUnavailable`] when
    /// permission is denied or no device is present.
    ///
    /// [`MonitorError::SensorUnavailable`]: crate::error::MonitorError::SensorUnavailable
    async fn acquire(&self, audio: &AudioAnalysisConfig) -> MonitorResult<Box<dyn SensorHandle>>;
}

/// Acquired capture tracks plus the shared analysis node.
///
/// Exclusively owned by the sampling task for the session's lifetime and
/// never shared across sessions.
pub trait SensorHandle: Send {
    /// Read the current video frame.
    fn video_frame(&mut self) -> MonitorResult<VideoFrame>;

    /// Read the current frequency-magnitude buffer from the analysis node.
    fn audio_spectrum(&mut self) -> MonitorResult<AudioSpectrum>;

    /// Stop all tracks and disconnect the analysis node.
    ///
    /// Idempotent and always safe to call, including on a handle that failed
    /// to fully acquire.
    fn release(&mut self);
}

/// Owns a [`SensorHandle`] for one session and releases it on drop.
///
/// Every exit path out of the sampling task (normal stop, forced
/// termination, task teardown) drops the guard, so tracks are always
/// stopped.
pub struct SensorGuard {
    handle: Box<dyn SensorHandle>,
}

impl SensorGuard {
    pub fn new(handle: Box<dyn SensorHandle>) -> Self {
        Self { handle }
    }

    pub fn video_frame(&mut self) -> MonitorResult<VideoFrame> {
        self.handle.video_frame()
    }

    pub fn audio_spectrum(&mut self) -> MonitorResult<AudioSpectrum> {
        self.handle.audio_spectrum()
    }
}

impl Drop for SensorGuard {
    fn drop(&mut self) {
        debug!("Releasing sensor handle");
        self.handle.release();
    }
}
