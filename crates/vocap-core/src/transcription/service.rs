use crate::transcription::{
    ApiScenario, TranscriptionError, VoiceRequest, VoiceResponse,
};

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub(crate) const SUCCESS_TRANSCRIPT: &str = "Added 'milk' to your shopping list.";
pub(crate) const CLARIFICATION_PROMPT: &str = "What time should I set it for?";
pub(crate) const FOLLOW_UP_TRANSCRIPT: &str = "Alarm set for 7:00 AM.";
pub(crate) const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";
pub(crate) const SERVER_ERROR_MESSAGE: &str =
    "The transcription service could not process your request.";

/// Shortest permitted simulated round trip.
const MIN_LATENCY: Duration = Duration::from_millis(500);
/// Longest permitted simulated round trip.
const MAX_LATENCY: Duration = Duration::from_millis(2000);
/// Round trip used unless configured otherwise.
const DEFAULT_LATENCY: Duration = Duration::from_millis(1000);

struct ServiceInner {
    scenario: ApiScenario,
    /// Clarification id issued by the last Clarify response, awaiting its
    /// follow-up. Cleared when answered or when the scenario changes.
    pending_clarification: Option<Uuid>,
}

/// Simulated transcription backend.
///
/// The configured [`ApiScenario`] deterministically controls which result
/// the next call produces, after the full simulated latency has elapsed.
/// No partial or streaming results. One instance per controller; all
/// bookkeeping is instance state, never global.
pub struct TranscriptionService {
    inner: Mutex<ServiceInner>,
    latency: Duration,
}

impl TranscriptionService {
    /// Creates a service with the default simulated latency.
    pub fn new(scenario: ApiScenario) -> Self {
        Self::with_latency(scenario, DEFAULT_LATENCY)
    }

    /// Creates a service with a specific latency, clamped to the
    /// 500–2000ms reference range.
    pub fn with_latency(scenario: ApiScenario, latency: Duration) -> Self {
        Self {
            inner: Mutex::new(ServiceInner {
                scenario,
                pending_clarification: None,
            }),
            latency: latency.clamp(MIN_LATENCY, MAX_LATENCY),
        }
    }

    /// The currently configured scenario.
    pub async fn scenario(&self) -> ApiScenario {
        self.inner.lock().await.scenario
    }

    /// Select the behavior of subsequent requests. Switching scenarios
    /// drops any clarification turn in progress.
    #[instrument(skip(self))]
    pub async fn set_scenario(&self, scenario: ApiScenario) {
        let mut inner = self.inner.lock().await;
        if inner.scenario != scenario {
            inner.pending_clarification = None;
        }
        inner.scenario = scenario;
        info!(scenario = %scenario, "Scenario selected");
    }

    /// Process one captured utterance.
    ///
    /// The full simulated latency is awaited before any result is
    /// produced.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::Network`] or
    /// [`TranscriptionError::Server`] per the configured scenario.
    #[instrument(skip(self, request), fields(mime_type = %request.mime_type))]
    pub async fn process_voice(
        &self,
        request: VoiceRequest,
    ) -> Result<VoiceResponse, TranscriptionError> {
        tokio::time::sleep(self.latency).await;

        let mut inner = self.inner.lock().await;
        match inner.scenario {
            ApiScenario::Success => {
                debug!("Responding with final transcript");
                Ok(VoiceResponse::Transcript {
                    text: SUCCESS_TRANSCRIPT.to_string(),
                })
            }
            ApiScenario::Clarify => {
                let answers_pending = matches!(
                    (&request.clarification, inner.pending_clarification),
                    (Some(ctx), Some(pending)) if ctx.clarification_id == pending
                );

                if answers_pending {
                    inner.pending_clarification = None;
                    debug!("Clarification answered, responding with follow-up transcript");
                    Ok(VoiceResponse::Transcript {
                        text: FOLLOW_UP_TRANSCRIPT.to_string(),
                    })
                } else {
                    // Unknown or stale ids fall back to first-call behavior
                    // rather than failing the request.
                    let clarification_id = Uuid::new_v4();
                    inner.pending_clarification = Some(clarification_id);
                    debug!(clarification_id = %clarification_id, "Responding with clarification");
                    Ok(VoiceResponse::Clarification {
                        prompt: CLARIFICATION_PROMPT.to_string(),
                        clarification_id,
                    })
                }
            }
            ApiScenario::NetworkError => Err(TranscriptionError::Network {
                message: NETWORK_ERROR_MESSAGE.to_string(),
            }),
            ApiScenario::ServerError => Err(TranscriptionError::Server {
                message: SERVER_ERROR_MESSAGE.to_string(),
            }),
        }
    }
}
