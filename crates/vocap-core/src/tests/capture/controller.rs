use crate::{
    ApiScenario, CaptureController, CaptureState, ControllerConfig, ErrorKind, PermissionPolicy,
    Recorder, TranscriptionService,
    transcription::{
        CLARIFICATION_PROMPT, FOLLOW_UP_TRANSCRIPT, NETWORK_ERROR_MESSAGE, SUCCESS_TRANSCRIPT,
    },
};

use std::{path::Path, time::Duration};

use tempfile::TempDir;

#[allow(clippy::unwrap_used)]
fn controller(scenario: ApiScenario, policy: PermissionPolicy) -> (CaptureController, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::new(dir.path().to_path_buf(), policy).unwrap();
    let service = TranscriptionService::with_latency(scenario, Duration::from_millis(500));
    let config = ControllerConfig {
        tick_interval: Duration::from_millis(100),
        expire_after: Duration::from_secs(1),
    };
    (CaptureController::new(recorder, service, config), dir)
}

#[allow(clippy::unwrap_used)]
async fn wait_for(
    controller: &CaptureController,
    pred: impl Fn(&CaptureState) -> bool,
) -> CaptureState {
    let mut rx = controller.state_receiver();
    rx.wait_for(|s| pred(s)).await.unwrap().clone()
}

#[allow(clippy::unwrap_used)]
fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// WHAT: One success cycle walks Listening, Processing, Result, Idle
/// WHY: The happy path must traverse every state the transition table names
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_success_scenario_when_cycling_then_result_then_idle_with_one_entry() {
    // Given: A controller with granted permission and a success backend
    let (controller, dir) = controller(ApiScenario::Success, PermissionPolicy::Granted);
    assert_eq!(controller.current_state(), CaptureState::Idle);

    // When: Starting a capture
    controller.request_start().await;

    // Then: Listening from zero
    assert_eq!(
        controller.current_state(),
        CaptureState::Listening { elapsed_ms: 0 }
    );

    // When: Stopping
    controller.request_stop().await;

    // Then: Processing, then the fixed success transcript
    assert_eq!(controller.current_state(), CaptureState::Processing);
    let state = wait_for(&controller, |s| matches!(s, CaptureState::Result { .. })).await;
    assert_eq!(
        state,
        CaptureState::Result {
            transcript: SUCCESS_TRANSCRIPT.to_string()
        }
    );

    // Then: Exactly one history entry and no file left behind
    let history = controller.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].text, SUCCESS_TRANSCRIPT);
    assert_eq!(files_in(dir.path()), 0);

    // Then: The result auto-expires back to Idle, history untouched
    wait_for(&controller, |s| matches!(s, CaptureState::Idle)).await;
    assert_eq!(controller.history().await.len(), 1);
}

/// WHAT: Elapsed time ticks while listening and stops after the capture ends
/// WHY: Ticks are stale completions once the state leaves Listening
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used, clippy::panic)]
async fn given_listening_when_time_passes_then_elapsed_ticks_and_stops_on_stop() {
    // Given: A capture in progress
    let (controller, _dir) = controller(ApiScenario::Success, PermissionPolicy::Granted);
    controller.request_start().await;

    // When: 350ms pass
    tokio::time::sleep(Duration::from_millis(350)).await;

    // Then: The elapsed time was refreshed by the tick task
    match controller.current_state() {
        CaptureState::Listening { elapsed_ms } => {
            assert!((200..=350).contains(&elapsed_ms), "elapsed {}", elapsed_ms);
        }
        other => panic!("expected listening, got {:?}", other),
    }

    // When: Stopping and letting more ticks fire
    controller.request_stop().await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Then: No stale tick re-entered Listening
    assert_eq!(controller.current_state(), CaptureState::Processing);
}

/// WHAT: Duplicate intents are no-ops for the current state
/// WHY: Out-of-order or repeated UI events must never corrupt the machine
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_invalid_states_when_duplicating_intents_then_noops() {
    let (controller, _dir) = controller(ApiScenario::Success, PermissionPolicy::Granted);

    // When: Stopping and cancelling while Idle
    controller.request_stop().await;
    controller.request_cancel().await;
    controller.dismiss_error().await;

    // Then: Still Idle
    assert_eq!(controller.current_state(), CaptureState::Idle);

    // When: Starting twice
    controller.request_start().await;
    controller.request_start().await;

    // Then: Still a single Listening capture
    assert!(matches!(
        controller.current_state(),
        CaptureState::Listening { .. }
    ));

    // When: Stopping twice in immediate succession
    controller.request_stop().await;
    controller.request_stop().await;

    // Then: Same end state as a single stop
    assert_eq!(controller.current_state(), CaptureState::Processing);
    wait_for(&controller, |s| matches!(s, CaptureState::Result { .. })).await;
    assert_eq!(controller.history().await.len(), 1);
}

/// WHAT: Cancel mid-recording discards everything and issues no request
/// WHY: A cancelled capture must leave no file and no transcript behind
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_listening_when_cancelling_then_idle_with_no_file_and_no_request() {
    // Given: A capture in progress
    let (controller, dir) = controller(ApiScenario::Success, PermissionPolicy::Granted);
    controller.request_start().await;
    assert_eq!(files_in(dir.path()), 1);

    // When: Cancelling before stop
    controller.request_cancel().await;

    // Then: Idle, file removed
    assert_eq!(controller.current_state(), CaptureState::Idle);
    assert_eq!(files_in(dir.path()), 0);

    // Then: Well past the backend latency, nothing ever arrives
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(controller.current_state(), CaptureState::Idle);
    assert!(controller.history().await.is_empty());
}

/// WHAT: Network failure keeps the capture; dismissing releases it
/// WHY: Retention law - Error{Network} always carries a live recording
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_network_error_when_cycle_fails_then_recording_retained_until_dismissed() {
    // Given: One prior successful transcript
    let (controller, dir) = controller(ApiScenario::Success, PermissionPolicy::Granted);
    controller.request_start().await;
    controller.request_stop().await;
    wait_for(&controller, |s| matches!(s, CaptureState::Result { .. })).await;

    // When: The next cycle hits a network failure
    controller.set_scenario(ApiScenario::NetworkError).await;
    controller.request_start().await;
    controller.request_stop().await;
    let state = wait_for(&controller, |s| matches!(s, CaptureState::Error { .. })).await;

    // Then: Classified as network with the fixed message
    assert_eq!(
        state,
        CaptureState::Error {
            message: NETWORK_ERROR_MESSAGE.to_string(),
            kind: ErrorKind::Network,
        }
    );

    // Then: The capture is still on disk for a retry
    let retained = controller.retained_recording().await;
    let retained = retained.as_ref().map(|r| r.path.clone()).unwrap();
    assert!(retained.exists());
    assert_eq!(files_in(dir.path()), 1);

    // Then: The prior transcript survived the failure
    assert_eq!(controller.history().await.len(), 1);

    // When: Dismissing the error
    controller.dismiss_error().await;

    // Then: Idle, retained capture released
    assert_eq!(controller.current_state(), CaptureState::Idle);
    assert!(controller.retained_recording().await.is_none());
    assert_eq!(files_in(dir.path()), 0);
}

/// WHAT: Server failure discards the capture immediately
/// WHY: Retention law - Error{Server} never carries a recording
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_server_error_when_cycle_fails_then_recording_deleted() {
    // Given: A controller with a server-failing backend
    let (controller, dir) = controller(ApiScenario::ServerError, PermissionPolicy::Granted);

    // When: One full cycle
    controller.request_start().await;
    controller.request_stop().await;
    let state = wait_for(&controller, |s| matches!(s, CaptureState::Error { .. })).await;

    // Then: Classified as server, nothing retained, nothing on disk
    assert!(matches!(
        state,
        CaptureState::Error {
            kind: ErrorKind::Server,
            ..
        }
    ));
    assert!(controller.retained_recording().await.is_none());
    assert_eq!(files_in(dir.path()), 0);
    assert!(controller.history().await.is_empty());
}

/// WHAT: Clarify round trip - question first, follow-up transcript second
/// WHY: A new recording while a clarification is pending attaches to it
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used, clippy::panic)]
async fn given_clarify_scenario_when_two_cycles_then_question_then_follow_up() {
    // Given: A controller with a clarifying backend
    let (controller, _dir) = controller(ApiScenario::Clarify, PermissionPolicy::Granted);

    // When: The first cycle
    controller.request_start().await;
    controller.request_stop().await;
    let state = wait_for(&controller, |s| {
        matches!(s, CaptureState::Clarification { .. })
    })
    .await;

    // Then: The fixed question; the clarification is not a transcript
    match &state {
        CaptureState::Clarification { prompt, .. } => assert_eq!(prompt, CLARIFICATION_PROMPT),
        other => panic!("expected clarification, got {:?}", other),
    }
    assert!(controller.history().await.is_empty());
    assert!(controller.pending_clarification().await.is_some());

    // When: A second full cycle immediately after
    controller.request_start().await;
    controller.request_stop().await;
    let state = wait_for(&controller, |s| matches!(s, CaptureState::Result { .. })).await;

    // Then: The follow-up transcript, one new history entry in total
    assert_eq!(
        state,
        CaptureState::Result {
            transcript: FOLLOW_UP_TRANSCRIPT.to_string()
        }
    );
    assert_eq!(controller.history().await.len(), 1);
    assert!(controller.pending_clarification().await.is_none());
}

/// WHAT: An unanswered clarification expires and drops its context
/// WHY: The single clarification slot must not outlive its display window
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_clarification_when_expiring_unanswered_then_slot_cleared() {
    // Given: A clarification on screen
    let (controller, _dir) = controller(ApiScenario::Clarify, PermissionPolicy::Granted);
    controller.request_start().await;
    controller.request_stop().await;
    wait_for(&controller, |s| {
        matches!(s, CaptureState::Clarification { .. })
    })
    .await;

    // When: It auto-expires without a follow-up
    wait_for(&controller, |s| matches!(s, CaptureState::Idle)).await;

    // Then: The pending turn is gone; the next cycle is a fresh question
    assert!(controller.pending_clarification().await.is_none());
    controller.request_start().await;
    controller.request_stop().await;
    let state = wait_for(&controller, |s| {
        matches!(
            s,
            CaptureState::Clarification { .. } | CaptureState::Result { .. }
        )
    })
    .await;
    assert!(matches!(state, CaptureState::Clarification { .. }));
}

/// WHAT: A new start supersedes a pending auto-expire
/// WHY: The newest intent wins; a stale expiry must not yank a live capture
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_result_when_starting_before_expiry_then_expiry_is_noop() {
    // Given: A result on screen with its expiry pending
    let (controller, _dir) = controller(ApiScenario::Success, PermissionPolicy::Granted);
    controller.request_start().await;
    controller.request_stop().await;
    wait_for(&controller, |s| matches!(s, CaptureState::Result { .. })).await;

    // When: Starting a new capture before the expiry fires
    controller.request_start().await;
    assert!(matches!(
        controller.current_state(),
        CaptureState::Listening { .. }
    ));

    // When: Letting the stale expiry fire
    tokio::time::sleep(Duration::from_secs(2)).await;

    // Then: Still listening
    assert!(matches!(
        controller.current_state(),
        CaptureState::Listening { .. }
    ));
}

/// WHAT: A denied prompt lands in PermissionDenied without recording
/// WHY: start() must never be invoked when access is refused
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_denied_permission_when_starting_then_permission_denied_and_no_capture() {
    // Given: A controller whose permission prompt denies
    let (controller, dir) = controller(ApiScenario::Success, PermissionPolicy::PromptThenDeny);

    // When: Starting
    controller.request_start().await;

    // Then: PermissionDenied, no file ever created
    assert!(matches!(
        controller.current_state(),
        CaptureState::PermissionDenied { .. }
    ));
    assert_eq!(files_in(dir.path()), 0);

    // When: Retrying (denial is remembered) and then dismissing
    controller.retry_permission().await;
    assert!(matches!(
        controller.current_state(),
        CaptureState::PermissionDenied { .. }
    ));
    controller.dismiss_permission_denied().await;

    // Then: Back to Idle
    assert_eq!(controller.current_state(), CaptureState::Idle);
}

/// WHAT: A prompt that grants proceeds straight into Listening
/// WHY: First-use permission flow must not require a second gesture
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_undecided_permission_when_prompt_grants_then_listening() {
    // Given: A controller that must prompt on first use
    let (controller, _dir) = controller(ApiScenario::Success, PermissionPolicy::PromptThenGrant);

    // When: Starting
    controller.request_start().await;

    // Then: Listening from zero
    assert_eq!(
        controller.current_state(),
        CaptureState::Listening { elapsed_ms: 0 }
    );
}

/// WHAT: History only grows, most recent first
/// WHY: No event, including failures, may remove prior transcripts
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_multiple_cycles_when_interleaving_failures_then_history_monotonic() {
    // Given: Two successful cycles
    let (controller, _dir) = controller(ApiScenario::Success, PermissionPolicy::Granted);
    for _ in 0..2 {
        controller.request_start().await;
        controller.request_stop().await;
        wait_for(&controller, |s| matches!(s, CaptureState::Result { .. })).await;
    }
    assert_eq!(controller.history().await.len(), 2);

    // When: A failing cycle follows
    controller.set_scenario(ApiScenario::ServerError).await;
    controller.request_start().await;
    controller.request_stop().await;
    wait_for(&controller, |s| matches!(s, CaptureState::Error { .. })).await;

    // Then: Both entries survive, newest first by timestamp
    let history = controller.history().await;
    assert_eq!(history.len(), 2);
    assert!(history[0].created_at >= history[1].created_at);
    assert_ne!(history[0].id, history[1].id);
}
