use uuid::Uuid;

/// Classification of a failed transcription attempt, visible to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transient connectivity failure; the captured audio is kept for retry.
    Network,
    /// The request was received but could not be fulfilled; retrying the
    /// same audio is not expected to help.
    Server,
}

/// Capture workflow state. Exactly one variant is active at any instant.
///
/// Every transition is triggered by exactly one user intent
/// (start/stop/cancel/dismiss/retry) or one asynchronous completion
/// (permission result, transcription result, tick, auto-expire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    /// Ready to start a capture. Initial and terminal-recovery state.
    Idle,
    /// Microphone permission probe or prompt in flight.
    CheckingPermission,
    /// Microphone access was declined.
    PermissionDenied {
        /// User-facing explanation.
        message: String,
    },
    /// Actively capturing audio.
    Listening {
        /// Milliseconds recorded so far, refreshed every tick.
        elapsed_ms: u64,
    },
    /// Transcription request in flight.
    Processing,
    /// A final transcript arrived. Transient; auto-expires to Idle.
    Result {
        /// The transcribed text.
        transcript: String,
    },
    /// The backend asked a follow-up question. Transient; auto-expires.
    Clarification {
        /// The question to show the user.
        prompt: String,
        /// Identifier the next capture must carry to answer it.
        clarification_id: Uuid,
    },
    /// A capture or transcription attempt failed.
    Error {
        /// User-facing explanation.
        message: String,
        /// Whether the failure is retry-eligible.
        kind: ErrorKind,
    },
}

impl CaptureState {
    /// Short tag for log correlation.
    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::CheckingPermission => "checking_permission",
            CaptureState::PermissionDenied { .. } => "permission_denied",
            CaptureState::Listening { .. } => "listening",
            CaptureState::Processing => "processing",
            CaptureState::Result { .. } => "result",
            CaptureState::Clarification { .. } => "clarification",
            CaptureState::Error { .. } => "error",
        }
    }
}
