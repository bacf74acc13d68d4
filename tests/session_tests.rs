// End-to-end orchestrator tests against an in-process exchange server,
// plus phase-machine tests at the state level.

mod common;

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use common::{
    completed, continuation, network_error, test_media_config, test_session_config, FakeExchangeApi,
};
use vivavoce::channels::{ChannelEvent, ProctoringResult};
use vivavoce::error::SessionError;
use vivavoce::exchange::{ExchangeApi, StartResponse};
use vivavoce::media::{MediaBackend, SyntheticBackend};
use vivavoce::session::{
    FinalSummary, InterviewSession, InterviewState, Phase, SessionHandle, SessionView, Speaker,
    StatsSnapshot,
};
use vivavoce::speech::{FixedDelaySpeechDriver, SpeechDriver};

type SessionTask = JoinHandle<Result<FinalSummary, SessionError>>;

async fn start_session(api: Arc<FakeExchangeApi>, chunk_bytes: usize) -> (SessionTask, SessionHandle) {
    let backend: Arc<dyn MediaBackend> =
        Arc::new(SyntheticBackend::new(test_media_config()).with_chunk_bytes(chunk_bytes));
    let speech: Arc<dyn SpeechDriver> =
        Arc::new(FixedDelaySpeechDriver::new(Duration::from_millis(5)));

    let (session, handle) =
        InterviewSession::begin(test_session_config(), backend, speech, api as Arc<dyn ExchangeApi>)
            .await
            .expect("session begins");

    (tokio::spawn(session.run()), handle)
}

async fn wait_for<F>(
    watch: &mut watch::Receiver<SessionView>,
    what: &str,
    predicate: F,
) -> SessionView
where
    F: Fn(&SessionView) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let view = watch.borrow_and_update().clone();
            if predicate(&view) {
                return view;
            }
            if watch.changed().await.is_err() {
                panic!("session ended while waiting for {what}");
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
}

#[tokio::test]
async fn test_full_turn_advances_to_next_question() {
    let api = Arc::new(FakeExchangeApi::new(vec![continuation("Describe Y", 2)]));
    let (task, handle) = start_session(Arc::clone(&api), 50_000).await;
    let mut watch = handle.watch();

    // Playback finishes, recording starts
    wait_for(&mut watch, "recording", |v| v.phase == Phase::Recording).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    handle.advance().await;
    let view = wait_for(&mut watch, "next question", |v| {
        v.current_question == "Describe Y"
    })
    .await;

    assert_eq!(view.question_number, 2);
    assert_eq!(view.phase, Phase::AwaitingPlayback);

    // Candidate entry and next interviewer entry were appended
    assert_eq!(view.conversation.len(), 3);
    assert_eq!(view.conversation[0].speaker, Speaker::Interviewer);
    assert_eq!(view.conversation[1].speaker, Speaker::Candidate);
    assert_eq!(view.conversation[2].speaker, Speaker::Interviewer);
    assert_eq!(view.conversation[2].text, "Describe Y");

    // The recorded clip rode along, whole chunks base64-encoded
    let requests = api.requests.lock().await;
    assert_eq!(requests.len(), 1);
    let encoded = requests[0].video.as_ref().expect("clip attached");
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    assert!(decoded.len() >= 50_000);
    assert_eq!(decoded.len() % 50_000, 0);
    drop(requests);

    handle.end().await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_duplicate_advance_sends_one_request() {
    let api = Arc::new(
        FakeExchangeApi::new(vec![continuation("Describe Y", 2)])
            .with_latency(Duration::from_millis(100)),
    );
    let (task, handle) = start_session(Arc::clone(&api), 50_000).await;
    let mut watch = handle.watch();

    wait_for(&mut watch, "recording", |v| v.phase == Phase::Recording).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Second advance lands while the exchange is in flight and is dropped
    handle.advance().await;
    handle.advance().await;

    wait_for(&mut watch, "next question", |v| {
        v.current_question == "Describe Y"
    })
    .await;

    assert_eq!(api.request_count().await, 1);

    handle.end().await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_failed_exchange_allows_a_fresh_advance() {
    // Primary and fallback both fail, then the re-advance succeeds
    let api = Arc::new(FakeExchangeApi::new(vec![
        network_error(),
        network_error(),
        continuation("Describe Y", 2),
    ]));
    let (task, handle) = start_session(Arc::clone(&api), 50_000).await;
    let mut watch = handle.watch();

    wait_for(&mut watch, "recording", |v| v.phase == Phase::Recording).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    handle.advance().await;
    let view = wait_for(&mut watch, "failed submission", |v| {
        v.phase == Phase::Submitting { in_flight: false }
    })
    .await;
    assert!(view.last_error.is_some());

    handle.advance().await;
    let view = wait_for(&mut watch, "next question", |v| {
        v.current_question == "Describe Y"
    })
    .await;
    assert!(view.last_error.is_none());

    // Primary, one fallback, then the successful re-advance
    assert_eq!(api.request_count().await, 3);

    handle.end().await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_terminal_response_completes_the_interview() {
    let api = Arc::new(FakeExchangeApi::new(vec![completed("Great job")]));
    let (task, handle) = start_session(Arc::clone(&api), 50_000).await;
    let mut watch = handle.watch();

    wait_for(&mut watch, "recording", |v| v.phase == Phase::Recording).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    handle.advance().await;

    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.final_feedback.as_deref(), Some("Great job"));
    assert_eq!(summary.questions_reached, 1);
}

#[tokio::test]
async fn test_explicit_end_terminates_with_server_feedback() {
    let api = Arc::new(FakeExchangeApi::new(vec![]));
    let (task, handle) = start_session(Arc::clone(&api), 50_000).await;
    let mut watch = handle.watch();

    wait_for(&mut watch, "recording", |v| v.phase == Phase::Recording).await;

    handle.end().await;

    let summary = task.await.unwrap().unwrap();
    assert_eq!(
        summary.final_feedback.as_deref(),
        Some("Thanks for interviewing")
    );
    assert_eq!(summary.questions_reached, 1);
    assert_eq!(api.request_count().await, 0, "no answer exchange ran");
}

#[tokio::test]
async fn test_tiny_clip_submits_without_video() {
    // 10-byte chunks never reach the 100-byte minimum
    let api = Arc::new(FakeExchangeApi::new(vec![completed("Done")]));
    let (task, handle) = start_session(Arc::clone(&api), 10).await;
    let mut watch = handle.watch();

    wait_for(&mut watch, "recording", |v| v.phase == Phase::Recording).await;

    handle.advance().await;
    task.await.unwrap().unwrap();

    let requests = api.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].video.is_none());
}

#[tokio::test]
async fn test_dropped_handle_ends_the_session() {
    let api = Arc::new(FakeExchangeApi::new(vec![]));
    let (task, handle) = start_session(Arc::clone(&api), 50_000).await;

    drop(handle);

    // The run loop must notice and tear down rather than block forever
    let summary = tokio::time::timeout(Duration::from_secs(3), task)
        .await
        .expect("session returns after its last handle is gone")
        .unwrap()
        .unwrap();

    assert!(summary.final_feedback.is_none());
    assert_eq!(api.request_count().await, 0);
}

#[tokio::test]
async fn test_proctoring_warning_auto_clears() {
    let api = Arc::new(FakeExchangeApi::new(vec![]));
    let (task, handle) = start_session(Arc::clone(&api), 50_000).await;
    let mut watch = handle.watch();

    handle
        .deliver(ChannelEvent::Proctoring(ProctoringResult {
            detected: true,
            alerts: vec!["MULTIPLE PEOPLE DETECTED".to_string()],
            ..ProctoringResult::default()
        }))
        .await;

    let view = wait_for(&mut watch, "warning on display", |v| {
        !v.active_alerts.is_empty()
    })
    .await;
    assert_eq!(view.active_alerts, vec!["MULTIPLE PEOPLE DETECTED".to_string()]);

    // The display timer clears it without any further event
    wait_for(&mut watch, "warning cleared", |v| v.active_alerts.is_empty()).await;

    handle.end().await;
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_channel_events_merge_while_submitting() {
    let api = Arc::new(
        FakeExchangeApi::new(vec![continuation("Describe Y", 2)])
            .with_latency(Duration::from_millis(200)),
    );
    let (task, handle) = start_session(Arc::clone(&api), 50_000).await;
    let mut watch = handle.watch();

    wait_for(&mut watch, "recording", |v| v.phase == Phase::Recording).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    handle.advance().await;
    wait_for(&mut watch, "submitting", |v| {
        v.phase == Phase::Submitting { in_flight: true }
    })
    .await;

    // Signals land while the exchange is still in flight
    handle
        .deliver(ChannelEvent::Proctoring(ProctoringResult {
            detected: true,
            session_stats: Some(StatsSnapshot {
                multiple_faces: Some(2),
                total_alerts: Some(4),
                ..StatsSnapshot::default()
            }),
            ..ProctoringResult::default()
        }))
        .await;
    handle
        .deliver(ChannelEvent::TabWarning {
            count: 3,
            message: "Tab switch detected! (Total: 3)".to_string(),
        })
        .await;

    let view = wait_for(&mut watch, "merged stats", |v| v.stats.multiple_faces == 2).await;
    assert_eq!(view.phase, Phase::Submitting { in_flight: true });
    assert_eq!(view.stats.total_alerts, 4);
    assert_eq!(view.tab_switch_count, 3);

    wait_for(&mut watch, "next question", |v| {
        v.current_question == "Describe Y"
    })
    .await;

    // The in-flight request carried the snapshot copied at send time
    let requests = api.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].proctoring_stats.stats.multiple_faces, 0);
    assert_eq!(requests[0].proctoring_stats.tab_switch_count, 0);
    drop(requests);

    handle.end().await;
    task.await.unwrap().unwrap();
}

#[test]
fn test_only_permission_denied_is_unrecoverable() {
    assert!(!SessionError::PermissionDenied.is_recoverable());
    assert!(SessionError::EmptyAnswer.is_recoverable());
    assert!(SessionError::ExchangeFailed("connection refused".to_string()).is_recoverable());
    assert!(SessionError::DeviceUnavailable("busy".to_string()).is_recoverable());
}

// State-level phase machine tests

fn started_state() -> InterviewState {
    InterviewState::new(&StartResponse {
        session_id: "test-session".to_string(),
        question: "Describe X".to_string(),
        job_role: "software engineer".to_string(),
        candidate_name: "Test Candidate".to_string(),
        max_questions: None,
    })
}

#[test]
fn test_advance_only_accepted_while_recording_or_after_failure() {
    let mut state = started_state();
    assert!(!state.begin_submission(), "idle");

    state.begin();
    assert!(!state.begin_submission(), "awaiting playback");

    state.playback_finished();
    assert!(state.begin_submission(), "recording");
    assert!(!state.begin_submission(), "in flight");

    state.submission_failed("connection refused".to_string());
    assert_eq!(state.phase, Phase::Submitting { in_flight: false });
    assert!(state.begin_submission(), "re-advance after failure");
}

#[test]
fn test_stale_playback_signal_is_ignored() {
    let mut state = started_state();
    state.begin();
    assert!(state.playback_finished());

    // A second playback signal for the same question changes nothing
    assert!(!state.playback_finished());
    assert_eq!(state.phase, Phase::Recording);
}

#[test]
fn test_alerts_raise_a_warning_without_touching_stats() {
    use tokio::time::Instant;

    let mut state = started_state();
    let before = state.stats.clone();

    state.apply_proctoring(
        &ProctoringResult {
            detected: true,
            alerts: vec!["FACE COVERED".to_string(), "EYES COVERED".to_string()],
            proctoring_data: None,
            session_stats: None,
            timestamp: Some(1730000000.0),
        },
        Instant::now(),
    );

    // One consolidated warning carrying both alerts
    let warning = state.warning.as_ref().expect("warning raised");
    assert_eq!(warning.alerts.len(), 2);

    // Statistics only move when the server sends a snapshot
    assert_eq!(state.stats, before);

    state.clear_warning();
    assert!(state.warning.is_none());
    assert_eq!(state.stats, before);
}

#[test]
fn test_terminal_phase_freezes_the_session() {
    let mut state = started_state();
    state.begin();
    state.playback_finished();
    state.begin_submission();

    state.apply_completion("Well done", Phase::Completed);
    assert!(state.is_terminal());
    assert_eq!(state.context.question_number, 1);

    // No transition leaves a terminal phase
    assert!(!state.begin_submission());
    assert!(!state.playback_finished());
    assert!(!state.begin());
}
