//! Microphone resource and on-disk recording lifecycle.
//!
//! One capture may be active at a time. The recorder is the only
//! component that touches the storage directory; the controller handles
//! paths the recorder returns.

mod permission;

pub use permission::PermissionPolicy;

use crate::{CaptureError, CoreResult};

use std::{
    fs,
    panic::Location,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use error_location::ErrorLocation;
use permission::PermissionGate;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Format descriptor attached to every capture.
const MIME_TYPE: &str = "audio/wav";

/// One captured utterance, handed to the controller by [`Recorder::stop`].
///
/// Exclusively owned by the controller from that point: consumed by a
/// transcription request or deleted, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    /// Backing file under the recorder's storage directory.
    pub path: PathBuf,
    /// Capture length in milliseconds.
    pub duration_ms: u64,
    /// Format descriptor, e.g. `audio/wav`.
    pub mime_type: String,
}

struct ActiveCapture {
    path: PathBuf,
    started_at: Instant,
}

/// Owns the microphone permission state and the file lifecycle of one
/// audio capture at a time.
pub struct Recorder {
    storage_dir: PathBuf,
    permission: PermissionGate,
    active: Option<ActiveCapture>,
}

impl Recorder {
    /// Creates a recorder storing captures under `storage_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Storage`] if the directory cannot be created.
    #[track_caller]
    pub fn new(storage_dir: PathBuf, policy: PermissionPolicy) -> CoreResult<Self> {
        fs::create_dir_all(&storage_dir).map_err(|e| CaptureError::Storage {
            reason: format!("Failed to create storage dir {:?}: {}", storage_dir, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(storage_dir = ?storage_dir, "Recorder initialized");

        Ok(Self {
            storage_dir,
            permission: PermissionGate::new(policy),
            active: None,
        })
    }

    /// Non-mutating permission probe.
    pub fn check_permission(&self) -> bool {
        self.permission.granted()
    }

    /// Prompt for permission at most once; repeated calls return the
    /// remembered decision.
    pub fn request_permission(&mut self) -> bool {
        self.permission.request()
    }

    /// Begin a capture, creating its backing file and resetting the
    /// duration clock.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::AlreadyRecording`] if a capture is active,
    /// or [`CaptureError::Storage`] if the file cannot be created.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start(&mut self) -> CoreResult<()> {
        if self.active.is_some() {
            return Err(CaptureError::AlreadyRecording {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let path = self.storage_dir.join(format!("{}.wav", Uuid::new_v4()));
        fs::File::create(&path).map_err(|e| CaptureError::Storage {
            reason: format!("Failed to create recording file {:?}: {}", path, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(path = ?path, "Capture started");

        self.active = Some(ActiveCapture {
            path,
            started_at: Instant::now(),
        });

        Ok(())
    }

    /// Stop the capture, finalize its backing file, and hand it over.
    ///
    /// Fails cleanly if the backing file vanished out from under the
    /// capture rather than panicking.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NotRecording`] with no active capture, or
    /// [`CaptureError::Storage`] if the backing file is gone.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn stop(&mut self) -> CoreResult<Recording> {
        let capture = self.active.take().ok_or(CaptureError::NotRecording {
            location: ErrorLocation::from(Location::caller()),
        })?;

        if !capture.path.exists() {
            return Err(CaptureError::Storage {
                reason: format!("Recording file disappeared: {:?}", capture.path),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let duration_ms = capture.started_at.elapsed().as_millis() as u64;
        debug!(path = ?capture.path, duration_ms, "Capture stopped");

        Ok(Recording {
            path: capture.path,
            duration_ms,
            mime_type: MIME_TYPE.to_string(),
        })
    }

    /// Stop and discard the capture in progress. No-op when idle.
    #[instrument(skip(self))]
    pub fn cancel(&mut self) {
        match self.active.take() {
            Some(capture) => {
                self.delete_file(&capture.path);
                info!(path = ?capture.path, "Capture cancelled and discarded");
            }
            None => debug!("Cancel with no active capture, nothing to do"),
        }
    }

    /// Delete a recording file. Absence is logged, not propagated;
    /// calling twice is harmless.
    pub fn delete_file(&self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => debug!(path = ?path, "Recording file deleted"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?path, "Recording file already absent");
            }
            Err(e) => warn!(path = ?path, error = %e, "Failed to delete recording file"),
        }
    }

    /// Best-effort sweep of recordings older than `max_age`, tolerating
    /// per-file errors. Returns how many files were removed.
    #[instrument(skip(self))]
    pub fn cleanup_stale(&self, max_age: Duration) -> usize {
        let entries = match fs::read_dir(&self.storage_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(storage_dir = ?self.storage_dir, error = %e, "Stale sweep could not read storage dir");
                return 0;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(error = %e, "Stale sweep skipping unreadable entry");
                    continue;
                }
            };

            let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = ?path, error = %e, "Stale sweep skipping file without mtime");
                    continue;
                }
            };

            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age <= max_age {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = ?path, age_secs = age.as_secs(), "Stale recording removed");
                    removed += 1;
                }
                Err(e) => warn!(path = ?path, error = %e, "Stale sweep failed to remove file"),
            }
        }

        if removed > 0 {
            info!(removed, "Stale recording sweep complete");
        }

        removed
    }

    /// Whether a capture is in progress.
    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Milliseconds captured so far; 0 when idle.
    pub fn current_duration_ms(&self) -> u64 {
        self.active
            .as_ref()
            .map(|c| c.started_at.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }
}
