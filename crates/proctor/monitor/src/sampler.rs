//! One sampling tick: classify the current frame and analysis window,
//! collapse verdicts, and feed the ledger.
//!
//! At most one violation is recorded per tick. The tick's result is built
//! as an ordered verdict list (presence first, then noise) and collapsed
//! with a last-verdict-wins policy, so a loud tick overwrites a no-face
//! verdict rather than double-counting.

use std::sync::{Arc, Mutex};

use proctor_types::{MonitorEvent, SessionSnapshot, SessionState, ViolationKind};
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::classify::{Loudness, NoiseClassifier, Presence, PresenceClassifier};
use crate::config::MonitorConfig;
use crate::ledger::{RecordOutcome, ViolationLedger};
use crate::reporter::{self, ViolationReporter};
use crate::sensor::SensorGuard;

/// Result of one tick, as seen by the sampling loop.
#[derive(Debug)]
pub enum TickOutcome {
    /// Session not active; nothing evaluated.
    Skipped,

    /// Evaluated, no violation.
    Clean,

    /// A violation was recorded; the session remains active.
    Recorded,

    /// The recorded violation crossed the threshold; the session is now
    /// terminated and sampling must cease.
    Terminated(SessionSnapshot),
}

/// Drives both classifiers against the acquired sensors on each tick.
pub struct Sampler {
    presence: PresenceClassifier,
    noise: NoiseClassifier,
    sensors: SensorGuard,
    ledger: Arc<Mutex<ViolationLedger>>,
    reporter: Arc<dyn ViolationReporter>,
    count_tx: watch::Sender<u32>,
    event_tx: broadcast::Sender<MonitorEvent>,
}

impl Sampler {
    pub fn new(
        config: &MonitorConfig,
        sensors: SensorGuard,
        ledger: Arc<Mutex<ViolationLedger>>,
        reporter: Arc<dyn ViolationReporter>,
        count_tx: watch::Sender<u32>,
        event_tx: broadcast::Sender<MonitorEvent>,
    ) -> Self {
        Self {
            presence: PresenceClassifier::new(config.presence.clone()),
            noise: NoiseClassifier::new(config.noise.clone()),
            sensors,
            ledger,
            reporter,
            count_tx,
            event_tx,
        }
    }

    /// Execute one tick.
    ///
    /// A sensor read failure skips that classifier for the tick; the
    /// session state is never affected by a flaky device.
    pub fn tick(&mut self) -> TickOutcome {
        // Covers the race where a terminal state lands between the tick
        // being scheduled and executing.
        if self.ledger.lock().unwrap().state() != SessionState::Active {
            return TickOutcome::Skipped;
        }

        let mut verdicts: Vec<ViolationKind> = Vec::new();

        match self.sensors.video_frame() {
            Ok(frame) => {
                if self.presence.classify(&frame) == Presence::Absent {
                    verdicts.push(ViolationKind::NoFacePresent);
                }
            }
            Err(error) => debug!(%error, "Frame read failed; skipping presence check"),
        }

        match self.sensors.audio_spectrum() {
            Ok(spectrum) => {
                if self.noise.classify(&spectrum) == Loudness::Loud {
                    verdicts.push(ViolationKind::LoudAmbientNoise);
                }
            }
            Err(error) => debug!(%error, "Spectrum read failed; skipping noise check"),
        }

        // One violation per tick: the last verdict wins, so loud audio
        // overwrites a no-face verdict.
        let Some(kind) = verdicts.pop() else {
            return TickOutcome::Clean;
        };

        let (outcome, count) = {
            let mut ledger = self.ledger.lock().unwrap();
            (ledger.record(kind), ledger.violation_count())
        };

        match outcome {
            RecordOutcome::Recorded(violation) => {
                self.count_tx.send_replace(count);
                let _ = self.event_tx.send(MonitorEvent::ViolationRecorded {
                    violation: violation.clone(),
                    count,
                });
                reporter::dispatch(self.reporter.clone(), violation);
                TickOutcome::Recorded
            }
            RecordOutcome::ThresholdCrossed(violation) => {
                self.count_tx.send_replace(count);
                let _ = self.event_tx.send(MonitorEvent::ViolationRecorded {
                    violation: violation.clone(),
                    count,
                });
                reporter::dispatch(self.reporter.clone(), violation);
                TickOutcome::Terminated(self.ledger.lock().unwrap().snapshot())
            }
            RecordOutcome::Ignored => TickOutcome::Skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, RecordingReporter, SensorSample};
    use proctor_types::{ResultId, SessionParams, TestId};

    fn build_sampler(
        samples: Vec<SensorSample>,
        max_violations: u32,
    ) -> (Sampler, Arc<Mutex<ViolationLedger>>, Arc<RecordingReporter>) {
        let config = MonitorConfig::default();
        let params = SessionParams::new(TestId::generate(), ResultId::generate());
        let mut ledger = ViolationLedger::new(&params, max_violations);
        ledger.begin_acquiring().unwrap();
        ledger.activate().unwrap();
        let ledger = Arc::new(Mutex::new(ledger));

        let reporter = Arc::new(RecordingReporter::new());
        let (count_tx, _) = watch::channel(0);
        let (event_tx, _) = broadcast::channel(16);

        let guard = SensorGuard::new(Box::new(testing::ScriptedHandle::new(samples)));
        let sampler = Sampler::new(
            &config,
            guard,
            ledger.clone(),
            reporter.clone() as Arc<dyn ViolationReporter>,
            count_tx,
            event_tx,
        );
        (sampler, ledger, reporter)
    }

    #[tokio::test]
    async fn test_clean_tick_records_nothing() {
        let (mut sampler, ledger, reporter) =
            build_sampler(vec![SensorSample::clean()], 10);

        assert!(matches!(sampler.tick(), TickOutcome::Clean));
        assert_eq!(ledger.lock().unwrap().violation_count(), 0);
        tokio::task::yield_now().await;
        assert!(reporter.reports().is_empty());
    }

    #[tokio::test]
    async fn test_absent_frame_records_no_face() {
        let (mut sampler, ledger, _) = build_sampler(vec![SensorSample::absent()], 10);

        assert!(matches!(sampler.tick(), TickOutcome::Recorded));
        assert_eq!(
            ledger.lock().unwrap().last_violation(),
            Some(ViolationKind::NoFacePresent)
        );
    }

    #[tokio::test]
    async fn test_noise_overwrites_presence_verdict() {
        // A tick that is simultaneously absent and loud yields exactly one
        // violation, of the loud kind.
        let (mut sampler, ledger, reporter) =
            build_sampler(vec![SensorSample::absent_and_loud()], 10);

        assert!(matches!(sampler.tick(), TickOutcome::Recorded));
        let ledger = ledger.lock().unwrap();
        assert_eq!(ledger.violation_count(), 1);
        assert_eq!(
            ledger.last_violation(),
            Some(ViolationKind::LoudAmbientNoise)
        );
        drop(ledger);

        tokio::task::yield_now().await;
        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ViolationKind::LoudAmbientNoise);
    }

    #[tokio::test]
    async fn test_threshold_tick_terminates() {
        let (mut sampler, ledger, _) =
            build_sampler(vec![SensorSample::absent(), SensorSample::absent()], 2);

        assert!(matches!(sampler.tick(), TickOutcome::Recorded));
        match sampler.tick() {
            TickOutcome::Terminated(snapshot) => {
                assert_eq!(snapshot.violation_count, 2)
            }
            other => panic!("expected termination, got {other:?}"),
        }
        assert_eq!(ledger.lock().unwrap().state(), SessionState::Terminated);
    }

    #[tokio::test]
    async fn test_ticks_after_termination_are_skipped() {
        let (mut sampler, ledger, reporter) = build_sampler(
            vec![SensorSample::absent(), SensorSample::absent()],
            1,
        );

        assert!(matches!(sampler.tick(), TickOutcome::Terminated(_)));
        assert!(matches!(sampler.tick(), TickOutcome::Skipped));
        assert_eq!(ledger.lock().unwrap().violation_count(), 1);

        tokio::task::yield_now().await;
        assert_eq!(reporter.reports().len(), 1);
    }

    #[tokio::test]
    async fn test_sensor_read_failure_skips_classifier() {
        let (mut sampler, ledger, _) = build_sampler(vec![], 10);

        // An exhausted script with no fallback errors on every read; the
        // tick completes without touching the ledger.
        assert!(matches!(sampler.tick(), TickOutcome::Clean));
        assert_eq!(ledger.lock().unwrap().violation_count(), 0);
        assert_eq!(ledger.lock().unwrap().state(), SessionState::Active);
    }
}
