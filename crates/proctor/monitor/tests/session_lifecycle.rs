//! End-to-end session lifecycle tests driven with paused tokio time.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use proctor_monitor::testing::{
    RecordingHooks, RecordingReporter, ScriptedSensorStream, SensorSample,
    UnavailableSensorStream,
};
use proctor_monitor::{MonitorConfig, MonitorController, MonitorError};
use proctor_types::{ResultId, SessionParams, SessionState, TestId};

const TICK: Duration = Duration::from_millis(1500);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Harness {
    controller: MonitorController,
    reporter: Arc<RecordingReporter>,
    hooks: Arc<RecordingHooks>,
}

fn harness(stream: ScriptedSensorStream) -> (Harness, Arc<ScriptedSensorStream>) {
    init_tracing();
    let stream = Arc::new(stream);
    let reporter = Arc::new(RecordingReporter::new());
    let hooks = Arc::new(RecordingHooks::new());
    let controller = MonitorController::new(
        MonitorConfig::default(),
        stream.clone(),
        reporter.clone(),
        hooks.clone(),
    )
    .unwrap();
    (
        Harness {
            controller,
            reporter,
            hooks,
        },
        stream,
    )
}

fn params() -> SessionParams {
    SessionParams::new(TestId::generate(), ResultId::generate())
}

/// Advance paused time by `n` sampling periods, letting the loop run.
async fn run_ticks(n: u32) {
    for _ in 0..n {
        tokio::time::sleep(TICK).await;
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn absent_frames_terminate_at_threshold() {
    // Scenario A: ten absent-and-quiet ticks against the default threshold.
    let (h, _) = harness(ScriptedSensorStream::new(vec![SensorSample::absent()]));
    let mut count = h.controller.violation_count();

    h.controller.start(params()).await.unwrap();

    run_ticks(9).await;
    assert_eq!(*count.borrow_and_update(), 9);
    assert_eq!(h.controller.state().await, SessionState::Active);
    assert!(h.hooks.terminations().is_empty());

    run_ticks(1).await;
    assert_eq!(*count.borrow_and_update(), 10);
    assert_eq!(h.controller.state().await, SessionState::Terminated);

    let terminations = h.hooks.terminations();
    assert_eq!(terminations.len(), 1);
    assert_eq!(terminations[0].violation_count, 10);
}

#[tokio::test(start_paused = true)]
async fn simultaneous_verdicts_count_once() {
    // Scenario B: a tick that is both absent and loud records exactly one
    // violation, of the loud kind.
    let (h, _) = harness(ScriptedSensorStream::new(vec![
        SensorSample::absent_and_loud(),
        SensorSample::clean(),
    ]));

    h.controller.start(params()).await.unwrap();
    run_ticks(2).await;

    let reports = h.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind.as_str(), "loud_ambient_noise");
    assert_eq!(*h.controller.violation_count().borrow(), 1);
}

#[tokio::test(start_paused = true)]
async fn sensor_unavailable_blocks_start() {
    // Scenario C: acquisition failure never reaches Active and never ticks.
    let reporter = Arc::new(RecordingReporter::new());
    let hooks = Arc::new(RecordingHooks::new());
    let controller = MonitorController::new(
        MonitorConfig::default(),
        Arc::new(UnavailableSensorStream),
        reporter.clone(),
        hooks.clone(),
    )
    .unwrap();

    let result = controller.start(params()).await;
    assert!(matches!(
        result,
        Err(MonitorError::SensorUnavailable { .. })
    ));

    run_ticks(3).await;
    assert_eq!(*controller.violation_count().borrow(), 0);
    assert_eq!(controller.state().await, SessionState::Idle);
    assert!(reporter.reports().is_empty());
    assert!(hooks.terminations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn no_activity_after_termination() {
    // Scenario D: once terminated, further periods produce no reports and
    // the count stays at the threshold.
    let (h, stream) = harness(ScriptedSensorStream::new(vec![SensorSample::absent()]));
    let p = params().with_max_violations(2);

    h.controller.start(p).await.unwrap();
    run_ticks(2).await;
    assert_eq!(h.controller.state().await, SessionState::Terminated);
    assert!(stream.release_flag().load(Ordering::SeqCst));

    run_ticks(5).await;
    assert_eq!(h.reporter.reports().len(), 2);
    assert_eq!(*h.controller.violation_count().borrow(), 2);
    assert_eq!(h.hooks.terminations().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn clean_session_stays_quiet() {
    let (h, _) = harness(ScriptedSensorStream::new(vec![SensorSample::clean()]));

    h.controller.start(params()).await.unwrap();
    run_ticks(6).await;

    assert_eq!(*h.controller.violation_count().borrow(), 0);
    assert_eq!(h.controller.state().await, SessionState::Active);
    assert!(h.reporter.reports().is_empty());

    h.controller.stop().await.unwrap();
    assert_eq!(h.controller.state().await, SessionState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn stop_releases_sensors_and_is_idempotent() {
    let (h, stream) = harness(ScriptedSensorStream::new(vec![SensorSample::clean()]));

    h.controller.start(params()).await.unwrap();
    run_ticks(1).await;

    h.controller.stop().await.unwrap();
    assert!(stream.release_flag().load(Ordering::SeqCst));
    assert_eq!(h.controller.state().await, SessionState::Stopped);

    // Stopping again, and stopping with no session, change nothing.
    h.controller.stop().await.unwrap();
    assert_eq!(h.controller.state().await, SessionState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn stop_after_termination_keeps_terminated() {
    let (h, _) = harness(ScriptedSensorStream::new(vec![SensorSample::absent()]));
    let p = params().with_max_violations(1);

    h.controller.start(p).await.unwrap();
    run_ticks(1).await;
    assert_eq!(h.controller.state().await, SessionState::Terminated);

    h.controller.stop().await.unwrap();
    assert_eq!(h.controller.state().await, SessionState::Terminated);
    assert_eq!(h.hooks.terminations().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn second_start_rejected_while_active() {
    let (h, _) = harness(ScriptedSensorStream::new(vec![SensorSample::clean()]));

    h.controller.start(params()).await.unwrap();
    let result = h.controller.start(params()).await;
    assert!(matches!(result, Err(MonitorError::SessionAlreadyRunning)));
}

#[tokio::test(start_paused = true)]
async fn new_session_resets_count() {
    let (h, _) = harness(ScriptedSensorStream::new(vec![
        SensorSample::absent(),
        SensorSample::clean(),
    ]));

    h.controller.start(params()).await.unwrap();
    run_ticks(2).await;
    assert_eq!(*h.controller.violation_count().borrow(), 1);
    h.controller.stop().await.unwrap();

    h.controller.start(params()).await.unwrap();
    assert_eq!(*h.controller.violation_count().borrow(), 0);
}

#[tokio::test(start_paused = true)]
async fn event_stream_orders_terminated_path() {
    use proctor_types::MonitorEvent;

    let (h, _) = harness(ScriptedSensorStream::new(vec![SensorSample::absent()]));
    let mut events = h.controller.subscribe();
    let p = params().with_max_violations(2);

    h.controller.start(p).await.unwrap();
    run_ticks(2).await;

    let first = events.try_recv().unwrap();
    assert!(matches!(first, MonitorEvent::ViolationRecorded { count: 1, .. }));
    let second = events.try_recv().unwrap();
    assert!(matches!(second, MonitorEvent::ViolationRecorded { count: 2, .. }));
    match events.try_recv().unwrap() {
        MonitorEvent::SessionTerminated { snapshot } => {
            assert_eq!(snapshot.state, SessionState::Terminated);
            assert_eq!(snapshot.violation_count, 2);
        }
        other => panic!("expected termination event, got {other:?}"),
    }
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn event_stream_orders_stopped_path() {
    use proctor_types::MonitorEvent;

    let (h, _) = harness(ScriptedSensorStream::new(vec![
        SensorSample::absent(),
        SensorSample::clean(),
    ]));
    let mut events = h.controller.subscribe();

    h.controller.start(params()).await.unwrap();
    run_ticks(2).await;
    h.controller.stop().await.unwrap();

    let first = events.try_recv().unwrap();
    assert!(matches!(first, MonitorEvent::ViolationRecorded { count: 1, .. }));
    match events.try_recv().unwrap() {
        MonitorEvent::SessionStopped { snapshot } => {
            assert_eq!(snapshot.state, SessionState::Stopped);
            assert_eq!(snapshot.violation_count, 1);
        }
        other => panic!("expected stop event, got {other:?}"),
    }
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn snapshot_reflects_session_progress() {
    let (h, _) = harness(ScriptedSensorStream::new(vec![
        SensorSample::absent(),
        SensorSample::clean(),
    ]));

    assert!(h.controller.snapshot().await.is_none());

    let session_id = h.controller.start(params()).await.unwrap();
    run_ticks(1).await;

    let snapshot = h.controller.snapshot().await.unwrap();
    assert_eq!(snapshot.session_id, session_id);
    assert_eq!(snapshot.state, SessionState::Active);
    assert_eq!(snapshot.violation_count, 1);
    assert_eq!(
        snapshot.last_violation.map(|k| k.as_str()),
        Some("no_face_present")
    );

    h.controller.stop().await.unwrap();
    let snapshot = h.controller.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Stopped);
    assert_eq!(snapshot.violation_count, 1);
}

#[tokio::test(start_paused = true)]
async fn malformed_frames_do_not_kill_monitoring() {
    use proctor_monitor::testing::quiet_spectrum;
    use proctor_types::VideoFrame;

    // A handle whose frames promise more pixels than the buffer holds: the
    // short buffer reads as absent and the loop keeps running to the
    // threshold instead of panicking the sampling task.
    let truncated = SensorSample {
        frame: VideoFrame {
            width: 4,
            height: 4,
            pixels: vec![10, 20, 30],
        },
        spectrum: quiet_spectrum(),
    };
    let (h, _) = harness(ScriptedSensorStream::new(vec![truncated]));
    let p = params().with_max_violations(3);

    h.controller.start(p).await.unwrap();
    run_ticks(2).await;
    assert_eq!(h.controller.state().await, SessionState::Active);
    assert_eq!(*h.controller.violation_count().borrow(), 2);

    run_ticks(1).await;
    assert_eq!(h.controller.state().await, SessionState::Terminated);
    assert_eq!(h.hooks.terminations().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_report_delivery_never_blocks_sampling() {
    let stream = Arc::new(ScriptedSensorStream::new(vec![SensorSample::absent()]));
    let reporter = Arc::new(RecordingReporter::failing());
    let hooks = Arc::new(RecordingHooks::new());
    let controller = MonitorController::new(
        MonitorConfig::default(),
        stream,
        reporter,
        hooks.clone(),
    )
    .unwrap();

    let p = params().with_max_violations(3);
    controller.start(p).await.unwrap();
    run_ticks(3).await;

    // Every delivery failed, yet counting and termination proceeded.
    assert_eq!(*controller.violation_count().borrow(), 3);
    assert_eq!(controller.state().await, SessionState::Terminated);
    assert_eq!(hooks.terminations().len(), 1);
}
