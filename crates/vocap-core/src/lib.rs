//! Vocap Core Library
//!
//! Press-to-talk capture orchestration: a voice-capture state machine
//! coordinating a local recorder and a simulated transcription backend.
//!
//! # Example
//!
//! ```no_run
//! use vocap_core::{
//!     ApiScenario, CaptureController, ControllerConfig, CoreResult, PermissionPolicy,
//!     Recorder, TranscriptionService,
//! };
//!
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let recorder = Recorder::new(PathBuf::from("/tmp/vocap"), PermissionPolicy::Granted)?;
//!     let service = TranscriptionService::new(ApiScenario::Success);
//!     let controller =
//!         CaptureController::new(recorder, service, ControllerConfig::default());
//!
//!     controller.request_start().await;
//!     tokio::time::sleep(std::time::Duration::from_secs(2)).await;
//!     controller.request_stop().await;
//!
//!     Ok(())
//! }
//! ```

mod capture;
mod error;
mod recorder;
mod transcription;

pub use {
    capture::{CaptureController, CaptureState, ControllerConfig, ErrorKind, Transcript},
    error::{CaptureError, Result as CoreResult},
    recorder::{PermissionPolicy, Recorder, Recording},
    transcription::{
        ApiScenario, ClarificationContext, TranscriptionError, TranscriptionService, VoiceRequest,
        VoiceResponse,
    },
};

#[cfg(test)]
mod tests;
