//! Press-to-talk capture controller.
//!
//! Single source of truth for capture/transcription progress and the only
//! component permitted to call the [`Recorder`] or the
//! [`TranscriptionService`]. All transitions run with one lock held, so no
//! two transitions interleave; tick, auto-expire, and transcription tasks
//! re-validate the epoch and state they were issued under before applying
//! their effect.

use crate::{
    CaptureState, ErrorKind, Transcript,
    recorder::{Recorder, Recording},
    transcription::{
        ApiScenario, ClarificationContext, TranscriptionError, TranscriptionService, VoiceRequest,
        VoiceResponse,
    },
};

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Shown when microphone access is declined.
const PERMISSION_DENIED_MESSAGE: &str =
    "Microphone access is required to capture voice commands.";

/// Timing knobs for the controller, injected at construction so tests can
/// tighten them.
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// How often the Listening elapsed time is refreshed.
    pub tick_interval: Duration,
    /// How long Result and Clarification stay on screen before reverting
    /// to Idle.
    pub expire_after: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            expire_after: Duration::from_secs(4),
        }
    }
}

/// Everything a transition may touch, behind one lock.
struct Inner {
    state: CaptureState,
    /// Bumped on every user-intent transition. Deferred tasks capture the
    /// epoch they were issued under and become no-ops once it moves on.
    epoch: u64,
    /// Completed transcriptions, most recent first. Never shrunk.
    history: Vec<Transcript>,
    /// Single-slot pending clarification turn.
    clarification: Option<ClarificationContext>,
    /// Recording kept alive across a network-class error for retry.
    retained: Option<Recording>,
    recorder: Recorder,
    /// Current capture cycle, for log correlation.
    session_id: Uuid,
}

/// Press-to-talk capture state machine.
///
/// UI layers emit fire-and-forget intents into this type and observe the
/// current [`CaptureState`] through [`state_receiver`]. Intents invalid
/// for the current state are swallowed with a debug log, never an error.
///
/// [`state_receiver`]: CaptureController::state_receiver
pub struct CaptureController {
    inner: Arc<Mutex<Inner>>,
    service: Arc<TranscriptionService>,
    state_tx: watch::Sender<CaptureState>,
    config: ControllerConfig,
}

impl CaptureController {
    /// Creates a controller owning the given recorder and service.
    pub fn new(
        recorder: Recorder,
        service: TranscriptionService,
        config: ControllerConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(CaptureState::Idle);

        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: CaptureState::Idle,
                epoch: 0,
                history: Vec::new(),
                clarification: None,
                retained: None,
                recorder,
                session_id: Uuid::nil(),
            })),
            service: Arc::new(service),
            state_tx,
            config,
        }
    }

    /// Subscribe to state transitions.
    pub fn state_receiver(&self) -> watch::Receiver<CaptureState> {
        self.state_tx.subscribe()
    }

    /// Snapshot of the current state.
    pub fn current_state(&self) -> CaptureState {
        self.state_tx.borrow().clone()
    }

    /// Snapshot of the transcript history, most recent first.
    pub async fn history(&self) -> Vec<Transcript> {
        self.inner.lock().await.history.clone()
    }

    /// The recording kept alive by a network-class error, if any.
    pub async fn retained_recording(&self) -> Option<Recording> {
        self.inner.lock().await.retained.clone()
    }

    /// The pending clarification turn, if any.
    pub async fn pending_clarification(&self) -> Option<ClarificationContext> {
        self.inner.lock().await.clarification.clone()
    }

    /// The simulated backend's current scenario.
    pub async fn scenario(&self) -> ApiScenario {
        self.service.scenario().await
    }

    /// Select the simulated backend's behavior for subsequent requests.
    pub async fn set_scenario(&self, scenario: ApiScenario) {
        self.service.set_scenario(scenario).await;
    }

    /// Begin a capture: check permission, then start recording.
    ///
    /// No-op while CheckingPermission, Listening, or Processing — the
    /// newest intent wins everywhere else, superseding any pending
    /// auto-expire.
    #[instrument(skip(self))]
    pub async fn request_start(&self) {
        let (epoch, session_id) = {
            let mut inner = self.inner.lock().await;

            match inner.state {
                CaptureState::CheckingPermission
                | CaptureState::Listening { .. }
                | CaptureState::Processing => {
                    debug!(state = inner.state.label(), "start ignored in current state");
                    return;
                }
                _ => {}
            }

            inner.epoch += 1;
            inner.session_id = Uuid::new_v4();

            // Starting over from an Error releases the capture held for retry.
            if let Some(recording) = inner.retained.take() {
                inner.recorder.delete_file(&recording.path);
            }

            publish(&mut inner, &self.state_tx, CaptureState::CheckingPermission);
            (inner.epoch, inner.session_id)
        };

        // Permission phase: probe first, prompt only if needed.
        let granted = {
            let mut inner = self.inner.lock().await;
            if inner.recorder.check_permission() {
                true
            } else {
                inner.recorder.request_permission()
            }
        };

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch || inner.state != CaptureState::CheckingPermission {
            debug!("permission result arrived after state moved on, dropping");
            return;
        }

        if !granted {
            info!(session_id = %session_id, "Microphone permission denied");
            publish(
                &mut inner,
                &self.state_tx,
                CaptureState::PermissionDenied {
                    message: PERMISSION_DENIED_MESSAGE.to_string(),
                },
            );
            return;
        }

        match inner.recorder.start() {
            Ok(()) => {
                publish(
                    &mut inner,
                    &self.state_tx,
                    CaptureState::Listening { elapsed_ms: 0 },
                );
                info!(session_id = %session_id, "Recording started");
                self.spawn_tick(epoch);
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Recorder failed to start");
                publish(
                    &mut inner,
                    &self.state_tx,
                    CaptureState::Error {
                        message: e.to_string(),
                        kind: ErrorKind::Server,
                    },
                );
            }
        }
    }

    /// End the capture and submit it for transcription.
    ///
    /// No-op outside Listening, so a duplicate stop never reaches an
    /// already-stopped recorder.
    #[instrument(skip(self))]
    pub async fn request_stop(&self) {
        let (epoch, session_id, recording, context) = {
            let mut inner = self.inner.lock().await;

            if !matches!(inner.state, CaptureState::Listening { .. }) {
                debug!(state = inner.state.label(), "stop ignored in current state");
                return;
            }

            // Bumping the epoch here also retires the tick task.
            inner.epoch += 1;
            let session_id = inner.session_id;

            let recording = match inner.recorder.stop() {
                Ok(r) => r,
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Recorder failed to stop");
                    publish(
                        &mut inner,
                        &self.state_tx,
                        CaptureState::Error {
                            message: e.to_string(),
                            kind: ErrorKind::Server,
                        },
                    );
                    return;
                }
            };

            publish(&mut inner, &self.state_tx, CaptureState::Processing);
            info!(
                session_id = %session_id,
                duration_ms = recording.duration_ms,
                "Recording stopped, transcribing"
            );

            // The pending clarification turn is consumed by this request.
            (inner.epoch, session_id, recording, inner.clarification.take())
        };

        let inner = Arc::clone(&self.inner);
        let service = Arc::clone(&self.service);
        let state_tx = self.state_tx.clone();
        let expire_after = self.config.expire_after;

        // The round trip is not cancellable once issued; a late response
        // against a moved-on state is dropped below.
        tokio::spawn(async move {
            let request = VoiceRequest {
                recording_path: recording.path.clone(),
                mime_type: recording.mime_type.clone(),
                client_timestamp: SystemTime::now(),
                clarification: context,
            };

            let outcome = service.process_voice(request).await;

            let mut guard = inner.lock().await;
            if guard.epoch != epoch || guard.state != CaptureState::Processing {
                debug!(
                    session_id = %session_id,
                    "transcription response arrived after state moved on, dropping"
                );
                guard.recorder.delete_file(&recording.path);
                return;
            }

            match outcome {
                Ok(VoiceResponse::Transcript { text }) => {
                    guard.recorder.delete_file(&recording.path);
                    guard.clarification = None;
                    guard.history.insert(0, Transcript::new(text.clone()));
                    info!(
                        session_id = %session_id,
                        text_len = text.len(),
                        "Transcription complete"
                    );
                    publish(
                        &mut guard,
                        &state_tx,
                        CaptureState::Result { transcript: text },
                    );
                    schedule_expire(Arc::clone(&inner), state_tx, expire_after, epoch);
                }
                Ok(VoiceResponse::Clarification {
                    prompt,
                    clarification_id,
                }) => {
                    guard.recorder.delete_file(&recording.path);
                    guard.clarification = Some(ClarificationContext {
                        clarification_id,
                        previous_prompt: prompt.clone(),
                    });
                    info!(
                        session_id = %session_id,
                        clarification_id = %clarification_id,
                        "Clarification requested"
                    );
                    publish(
                        &mut guard,
                        &state_tx,
                        CaptureState::Clarification {
                            prompt,
                            clarification_id,
                        },
                    );
                    schedule_expire(Arc::clone(&inner), state_tx, expire_after, epoch);
                }
                Err(TranscriptionError::Network { message }) => {
                    warn!(session_id = %session_id, "Transcription failed: network");
                    // Transient failure: keep the capture for a retry.
                    guard.retained = Some(recording);
                    publish(
                        &mut guard,
                        &state_tx,
                        CaptureState::Error {
                            message,
                            kind: ErrorKind::Network,
                        },
                    );
                }
                Err(TranscriptionError::Server { message }) => {
                    warn!(session_id = %session_id, "Transcription failed: server");
                    // Resubmitting unchanged input will fail again.
                    guard.recorder.delete_file(&recording.path);
                    publish(
                        &mut guard,
                        &state_tx,
                        CaptureState::Error {
                            message,
                            kind: ErrorKind::Server,
                        },
                    );
                }
            }
        });
    }

    /// Abandon the capture in progress and discard its file.
    ///
    /// No-op outside Listening. This is also the host's backgrounding
    /// hook: safe to call unconditionally.
    #[instrument(skip(self))]
    pub async fn request_cancel(&self) {
        let mut inner = self.inner.lock().await;

        if !matches!(inner.state, CaptureState::Listening { .. }) {
            debug!(state = inner.state.label(), "cancel ignored in current state");
            return;
        }

        inner.epoch += 1;
        inner.recorder.cancel();
        info!(session_id = %inner.session_id, "Recording cancelled");
        publish(&mut inner, &self.state_tx, CaptureState::Idle);
    }

    /// Acknowledge an error, releasing any capture held for retry.
    #[instrument(skip(self))]
    pub async fn dismiss_error(&self) {
        let mut inner = self.inner.lock().await;

        if !matches!(inner.state, CaptureState::Error { .. }) {
            debug!(state = inner.state.label(), "dismiss ignored in current state");
            return;
        }

        inner.epoch += 1;
        if let Some(recording) = inner.retained.take() {
            inner.recorder.delete_file(&recording.path);
        }
        publish(&mut inner, &self.state_tx, CaptureState::Idle);
    }

    /// Acknowledge the permission-denied notice.
    #[instrument(skip(self))]
    pub async fn dismiss_permission_denied(&self) {
        let mut inner = self.inner.lock().await;

        if !matches!(inner.state, CaptureState::PermissionDenied { .. }) {
            debug!(state = inner.state.label(), "dismiss ignored in current state");
            return;
        }

        inner.epoch += 1;
        publish(&mut inner, &self.state_tx, CaptureState::Idle);
    }

    /// Re-run the permission flow after a denial.
    #[instrument(skip(self))]
    pub async fn retry_permission(&self) {
        {
            let inner = self.inner.lock().await;
            if !matches!(inner.state, CaptureState::PermissionDenied { .. }) {
                debug!(state = inner.state.label(), "retry ignored in current state");
                return;
            }
        }
        self.request_start().await;
    }

    /// Refresh the Listening elapsed time until the epoch moves on.
    fn spawn_tick(&self, epoch: u64) {
        let inner = Arc::clone(&self.inner);
        let state_tx = self.state_tx.clone();
        let tick_interval = self.config.tick_interval;

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(tick_interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately.
            timer.tick().await;

            loop {
                timer.tick().await;

                let mut guard = inner.lock().await;
                if guard.epoch != epoch
                    || !matches!(guard.state, CaptureState::Listening { .. })
                {
                    break;
                }

                let elapsed_ms = guard.recorder.current_duration_ms();
                publish(&mut guard, &state_tx, CaptureState::Listening { elapsed_ms });
            }
        });
    }
}

/// Apply and broadcast a state transition.
fn publish(inner: &mut Inner, state_tx: &watch::Sender<CaptureState>, next: CaptureState) {
    debug!(from = inner.state.label(), to = next.label(), "state transition");
    inner.state = next;
    let _ = state_tx.send_replace(inner.state.clone());
}

/// Return a transient state to Idle after `delay`, unless a newer intent
/// or transition got there first.
fn schedule_expire(
    inner: Arc<Mutex<Inner>>,
    state_tx: watch::Sender<CaptureState>,
    delay: Duration,
    epoch: u64,
) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let mut guard = inner.lock().await;
        if guard.epoch != epoch {
            return;
        }

        match guard.state {
            CaptureState::Result { .. } => {
                publish(&mut guard, &state_tx, CaptureState::Idle);
            }
            CaptureState::Clarification { .. } => {
                // Expiring unanswered drops the pending clarification turn.
                guard.clarification = None;
                publish(&mut guard, &state_tx, CaptureState::Idle);
            }
            _ => {
                debug!(state = guard.state.label(), "expiry fired after state moved on");
            }
        }
    });
}
