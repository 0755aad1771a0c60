//! Test support: scripted sensor sources and recording collaborators.
//!
//! Everything here substitutes for the real camera/microphone and the
//! external audit-log and test-taking collaborators, so session behavior
//! can be exercised deterministically.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use proctor_types::{AudioSpectrum, SessionSnapshot, VideoFrame, Violation};

use crate::config::AudioAnalysisConfig;
use crate::controller::SessionHooks;
use crate::error::{MonitorError, MonitorResult};
use crate::reporter::ViolationReporter;
use crate::sensor::{SensorHandle, SensorStream};

const SKIN: (u8, u8, u8) = (150, 80, 60);
const GRAY: (u8, u8, u8) = (128, 128, 128);

/// Frame with a plausible face-sized skin region (~20% under any stride).
pub fn present_frame() -> VideoFrame {
    let (width, height) = (100u32, 8u32);
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for i in 0..(width * height) {
        let (r, g, b) = if i % 5 == 0 { SKIN } else { GRAY };
        pixels.extend_from_slice(&[r, g, b]);
    }
    VideoFrame::new(width, height, pixels)
}

/// Frame with no face-colored region at all.
pub fn absent_frame() -> VideoFrame {
    let (width, height) = (100u32, 8u32);
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for _ in 0..(width * height) {
        pixels.extend_from_slice(&[GRAY.0, GRAY.1, GRAY.2]);
    }
    VideoFrame::new(width, height, pixels)
}

/// Frame dominated by a single skin-toned surface (blocked camera).
pub fn blocked_frame() -> VideoFrame {
    let (width, height) = (100u32, 8u32);
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for _ in 0..(width * height) {
        pixels.extend_from_slice(&[SKIN.0, SKIN.1, SKIN.2]);
    }
    VideoFrame::new(width, height, pixels)
}

/// Spectrum well below the loudness threshold.
pub fn quiet_spectrum() -> AudioSpectrum {
    AudioSpectrum::new(vec![8; 64])
}

/// Spectrum well above the loudness threshold.
pub fn loud_spectrum() -> AudioSpectrum {
    AudioSpectrum::new(vec![200; 64])
}

/// One scripted tick's worth of sensor data.
#[derive(Clone)]
pub struct SensorSample {
    pub frame: VideoFrame,
    pub spectrum: AudioSpectrum,
}

impl SensorSample {
    /// Face present, room quiet.
    pub fn clean() -> Self {
        Self {
            frame: present_frame(),
            spectrum: quiet_spectrum(),
        }
    }

    /// No face, room quiet.
    pub fn absent() -> Self {
        Self {
            frame: absent_frame(),
            spectrum: quiet_spectrum(),
        }
    }

    /// Face present, room loud.
    pub fn loud() -> Self {
        Self {
            frame: present_frame(),
            spectrum: loud_spectrum(),
        }
    }

    /// No face and loud at once.
    pub fn absent_and_loud() -> Self {
        Self {
            frame: absent_frame(),
            spectrum: loud_spectrum(),
        }
    }
}

/// Handle that replays a fixed script, one sample per tick.
///
/// Once the script is exhausted the last sample repeats; a handle created
/// from an empty script fails every read, standing in for a flaky device.
pub struct ScriptedHandle {
    script: VecDeque<SensorSample>,
    current: Option<SensorSample>,
    released: Arc<AtomicBool>,
}

impl ScriptedHandle {
    pub fn new(samples: Vec<SensorSample>) -> Self {
        Self {
            script: samples.into(),
            current: None,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    fn with_release_flag(samples: Vec<SensorSample>, released: Arc<AtomicBool>) -> Self {
        Self {
            script: samples.into(),
            current: None,
            released,
        }
    }

    fn advance(&mut self) -> MonitorResult<&SensorSample> {
        if self.released.load(Ordering::SeqCst) {
            return Err(MonitorError::SensorRead {
                reason: "handle released".into(),
            });
        }
        if let Some(next) = self.script.pop_front() {
            self.current = Some(next);
        }
        self.current.as_ref().ok_or(MonitorError::SensorRead {
            reason: "script exhausted".into(),
        })
    }
}

impl SensorHandle for ScriptedHandle {
    fn video_frame(&mut self) -> MonitorResult<VideoFrame> {
        // The frame read starts a new tick; the spectrum read below reuses
        // the same sample.
        Ok(self.advance()?.frame.clone())
    }

    fn audio_spectrum(&mut self) -> MonitorResult<AudioSpectrum> {
        if self.released.load(Ordering::SeqCst) {
            return Err(MonitorError::SensorRead {
                reason: "handle released".into(),
            });
        }
        match &self.current {
            Some(sample) => Ok(sample.spectrum.clone()),
            None => Err(MonitorError::SensorRead {
                reason: "script exhausted".into(),
            }),
        }
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Sensor source that hands out [`ScriptedHandle`]s.
pub struct ScriptedSensorStream {
    samples: Vec<SensorSample>,
    released: Arc<AtomicBool>,
}

impl ScriptedSensorStream {
    pub fn new(samples: Vec<SensorSample>) -> Self {
        Self {
            samples,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the most recently acquired handle has been released.
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        self.released.clone()
    }
}

#[async_trait]
impl SensorStream for ScriptedSensorStream {
    async fn acquire(&self, _audio: &AudioAnalysisConfig) -> MonitorResult<Box<dyn SensorHandle>> {
        self.released.store(false, Ordering::SeqCst);
        Ok(Box::new(ScriptedHandle::with_release_flag(
            self.samples.clone(),
            self.released.clone(),
        )))
    }
}

/// Sensor source with no usable device: every acquisition fails.
pub struct UnavailableSensorStream;

#[async_trait]
impl SensorStream for UnavailableSensorStream {
    async fn acquire(&self, _audio: &AudioAnalysisConfig) -> MonitorResult<Box<dyn SensorHandle>> {
        Err(MonitorError::SensorUnavailable {
            reason: "camera permission denied".into(),
        })
    }
}

/// Reporter that keeps delivered violations in memory.
pub struct RecordingReporter {
    reports: Mutex<Vec<Violation>>,
    fail: bool,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Reporter whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn reports(&self) -> Vec<Violation> {
        self.reports.lock().unwrap().clone()
    }
}

impl Default for RecordingReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ViolationReporter for RecordingReporter {
    async fn report(&self, violation: &Violation) -> MonitorResult<()> {
        if self.fail {
            return Err(MonitorError::ReportDeliveryFailed {
                reason: "audit log unreachable".into(),
            });
        }
        self.reports.lock().unwrap().push(violation.clone());
        Ok(())
    }
}

/// Hooks that record termination notifications.
pub struct RecordingHooks {
    terminations: Mutex<Vec<SessionSnapshot>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self {
            terminations: Mutex::new(Vec::new()),
        }
    }

    pub fn terminations(&self) -> Vec<SessionSnapshot> {
        self.terminations.lock().unwrap().clone()
    }
}

impl Default for RecordingHooks {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionHooks for RecordingHooks {
    async fn on_terminated(&self, snapshot: SessionSnapshot) {
        self.terminations.lock().unwrap().push(snapshot);
    }
}
