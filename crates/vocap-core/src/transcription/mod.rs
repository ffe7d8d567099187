mod protocol;
mod service;

pub use {
    protocol::{ApiScenario, ClarificationContext, TranscriptionError, VoiceRequest, VoiceResponse},
    service::TranscriptionService,
};

#[cfg(test)]
pub(crate) use service::{
    CLARIFICATION_PROMPT, FOLLOW_UP_TRANSCRIPT, NETWORK_ERROR_MESSAGE, SERVER_ERROR_MESSAGE,
    SUCCESS_TRANSCRIPT,
};
