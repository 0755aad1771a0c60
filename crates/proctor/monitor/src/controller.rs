//! Session orchestration against the hosting test view's lifecycle.
//!
//! `start` acquires sensors and spawns the sampling task; `stop` ends the
//! session on the normal path. The task owns the sensor guard, so sensors
//! are released on every exit path: normal stop, forced termination, and
//! controller teardown (dropping the stop channel wakes the loop).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use proctor_types::{MonitorEvent, SessionId, SessionParams, SessionSnapshot, SessionState};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::ledger::ViolationLedger;
use crate::reporter::ViolationReporter;
use crate::sampler::{Sampler, TickOutcome};
use crate::sensor::{SensorGuard, SensorStream};

/// Callbacks into the test-taking collaborator.
#[async_trait]
pub trait SessionHooks: Send + Sync {
    /// Invoked at most once per session, when the violation threshold is
    /// crossed. After this the collaborator must discard further answer
    /// submissions for the attempt and mark it as flagged.
    async fn on_terminated(&self, snapshot: SessionSnapshot);
}

struct ActiveSession {
    ledger: Arc<Mutex<ViolationLedger>>,
    stop_tx: mpsc::Sender<()>,
    task: Option<JoinHandle<()>>,
}

/// Orchestrates sensor acquisition, the sampling loop, the ledger, and the
/// external collaborators for one session at a time.
pub struct MonitorController {
    config: MonitorConfig,
    sensors: Arc<dyn SensorStream>,
    reporter: Arc<dyn ViolationReporter>,
    hooks: Arc<dyn SessionHooks>,
    session: tokio::sync::Mutex<Option<ActiveSession>>,
    count_tx: watch::Sender<u32>,
    event_tx: broadcast::Sender<MonitorEvent>,
}

impl MonitorController {
    pub fn new(
        config: MonitorConfig,
        sensors: Arc<dyn SensorStream>,
        reporter: Arc<dyn ViolationReporter>,
        hooks: Arc<dyn SessionHooks>,
    ) -> MonitorResult<Self> {
        config.validate()?;
        let (count_tx, _) = watch::channel(0);
        let (event_tx, _) = broadcast::channel(64);

        Ok(Self {
            config,
            sensors,
            reporter,
            hooks,
            session: tokio::sync::Mutex::new(None),
            count_tx,
            event_tx,
        })
    }

    /// Live violation count for the UI: monotone within a session, reset to
    /// 0 when a new session starts.
    pub fn violation_count(&self) -> watch::Receiver<u32> {
        self.count_tx.subscribe()
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.event_tx.subscribe()
    }

    /// Snapshot of the current (or most recent) session, if any.
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let session = self.session.lock().await;
        session
            .as_ref()
            .map(|active| active.ledger.lock().unwrap().snapshot())
    }

    /// Start monitoring a test attempt.
    ///
    /// Acquires sensors, activates the ledger, and spawns the sampling loop.
    /// On [`MonitorError::SensorUnavailable`] the session never reaches
    /// `Active`, no timer is created, and the error is surfaced so the
    /// caller can block the test start.
    pub async fn start(&self, params: SessionParams) -> MonitorResult<SessionId> {
        let mut slot = self.session.lock().await;

        // A previous session must be fully torn down (sensors released)
        // before fresh tracks are acquired.
        if let Some(previous) = slot.as_mut() {
            if !previous.ledger.lock().unwrap().state().is_terminal() {
                return Err(MonitorError::SessionAlreadyRunning);
            }
            if let Some(task) = previous.task.take() {
                if let Err(error) = task.await {
                    warn!(%error, "Previous sampling task ended abnormally");
                }
            }
            *slot = None;
        }

        if params.max_violations == Some(0) {
            return Err(MonitorError::Configuration(
                "max_violations must be at least 1".into(),
            ));
        }

        let session_id = params.session_id.clone();
        let mut ledger = ViolationLedger::new(&params, self.config.max_violations);
        ledger.begin_acquiring()?;
        self.count_tx.send_replace(0);

        info!(session_id = %session_id, test_id = %params.test_id, "Acquiring sensors");
        let handle = match self.sensors.acquire(&self.config.audio).await {
            Ok(handle) => handle,
            Err(error) => {
                ledger.acquisition_failed();
                warn!(session_id = %session_id, %error, "Sensor acquisition failed");
                return Err(error);
            }
        };

        ledger.activate()?;
        info!(session_id = %session_id, "Monitoring session active");

        let ledger = Arc::new(Mutex::new(ledger));
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        let mut sampler = Sampler::new(
            &self.config,
            SensorGuard::new(handle),
            ledger.clone(),
            self.reporter.clone(),
            self.count_tx.clone(),
            self.event_tx.clone(),
        );
        let hooks = self.hooks.clone();
        let event_tx = self.event_tx.clone();
        let period = self.config.sample_interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let TickOutcome::Terminated(snapshot) = sampler.tick() {
                            hooks.on_terminated(snapshot.clone()).await;
                            let _ = event_tx.send(MonitorEvent::SessionTerminated { snapshot });
                            break;
                        }
                    }
                    // Fires on an explicit stop and when the controller is
                    // dropped (channel closed); either way sampling ends and
                    // the sensor guard is released below.
                    _ = stop_rx.recv() => break,
                }
            }
            // Sampler (and with it the sensor guard) drops here.
        });

        *slot = Some(ActiveSession {
            ledger,
            stop_tx,
            task: Some(task),
        });

        Ok(session_id)
    }

    /// End the session normally, when the candidate submits before the
    /// threshold is crossed.
    ///
    /// Stops the timer and releases sensors exactly like termination, but
    /// the attempt is not flagged. Idempotent: calling it twice, or after
    /// termination, changes nothing.
    pub async fn stop(&self) -> MonitorResult<()> {
        let mut slot = self.session.lock().await;
        let Some(active) = slot.as_mut() else {
            return Ok(());
        };

        let (stopped, snapshot) = {
            let mut ledger = active.ledger.lock().unwrap();
            (ledger.stop(), ledger.snapshot())
        };

        // Wake the loop; send fails harmlessly when the task already exited.
        let _ = active.stop_tx.try_send(());
        if let Some(task) = active.task.take() {
            if let Err(error) = task.await {
                warn!(%error, "Sampling task ended abnormally");
            }
        }

        if stopped {
            info!(session_id = %snapshot.session_id, "Monitoring session stopped");
            let _ = self.event_tx.send(MonitorEvent::SessionStopped { snapshot });
        }

        Ok(())
    }

    /// Current session state, `Idle` when none has been started.
    pub async fn state(&self) -> SessionState {
        let session = self.session.lock().await;
        session
            .as_ref()
            .map(|active| active.ledger.lock().unwrap().state())
            .unwrap_or(SessionState::Idle)
    }
}
