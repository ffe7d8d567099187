use std::{fmt, path::PathBuf, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Selects the simulated backend's behavior for subsequent requests.
///
/// Runtime-mutable through [`TranscriptionService::set_scenario`] only,
/// and orthogonal to the capture state. Serialized as a single string so
/// the host can persist it.
///
/// [`TranscriptionService::set_scenario`]: crate::TranscriptionService::set_scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiScenario {
    /// Every request yields a final transcript.
    Success,
    /// The first request yields a clarification question; a follow-up
    /// carrying its id yields the final transcript.
    Clarify,
    /// Every request fails with a transient connectivity error.
    NetworkError,
    /// Every request fails with a non-retryable server error.
    ServerError,
}

impl fmt::Display for ApiScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiScenario::Success => "success",
            ApiScenario::Clarify => "clarify",
            ApiScenario::NetworkError => "network_error",
            ApiScenario::ServerError => "server_error",
        };
        f.write_str(name)
    }
}

impl FromStr for ApiScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(ApiScenario::Success),
            "clarify" => Ok(ApiScenario::Clarify),
            "network_error" | "network-error" | "network" => Ok(ApiScenario::NetworkError),
            "server_error" | "server-error" | "server" => Ok(ApiScenario::ServerError),
            other => Err(format!(
                "Unknown scenario '{}' (expected success, clarify, network_error, or server_error)",
                other
            )),
        }
    }
}

/// Links a follow-up utterance to the clarification question it answers.
///
/// Single-slot per controller: at most one clarification turn is
/// outstanding at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClarificationContext {
    /// Id issued with the clarification question.
    pub clarification_id: Uuid,
    /// The question that was asked, for log context.
    pub previous_prompt: String,
}

/// One transcription request. A real deployment would carry this same
/// shape over a network RPC.
#[derive(Debug, Clone)]
pub struct VoiceRequest {
    /// Backing file of the captured utterance.
    pub recording_path: PathBuf,
    /// Format descriptor of the capture.
    pub mime_type: String,
    /// When the client issued the request.
    pub client_timestamp: SystemTime,
    /// The clarification turn this utterance answers, if any.
    pub clarification: Option<ClarificationContext>,
}

/// Successful outcome of a transcription request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceResponse {
    /// A final transcript.
    Transcript {
        /// The transcribed text.
        text: String,
    },
    /// The backend needs a follow-up before it can produce a transcript.
    Clarification {
        /// The question to ask the user.
        prompt: String,
        /// Id the follow-up request must carry.
        clarification_id: Uuid,
    },
}

/// Classified transcription failure. The kind is caller-visible: network
/// failures are retry-eligible, server failures are not.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionError {
    /// Transient connectivity failure; the capture should be kept for retry.
    #[error("Network failure: {message}")]
    Network {
        /// User-facing explanation.
        message: String,
    },

    /// The request was received but could not be fulfilled; resubmitting
    /// unchanged input is expected to fail again.
    #[error("Server failure: {message}")]
    Server {
        /// User-facing explanation.
        message: String,
    },
}
