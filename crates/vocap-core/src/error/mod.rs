use error_location::ErrorLocation;
use thiserror::Error;

/// Capture and recording errors with source location tracking.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// `start()` was called while a capture is already active.
    #[error("Recorder is already capturing {location}")]
    AlreadyRecording {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// `stop()` was called with no active capture.
    #[error("No active capture to stop {location}")]
    NotRecording {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Storage I/O failed while managing a recording file.
    #[error("Storage error: {reason} {location}")]
    Storage {
        /// Description of the storage failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`CaptureError`].
pub type Result<T> = std::result::Result<T, CaptureError>;
