use std::time::SystemTime;

use uuid::Uuid;

/// One completed transcription, as shown in the history list.
///
/// Entries are appended most-recent-first and never mutated or removed
/// by the controller; retention policy is a host concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// Unique entry id.
    pub id: Uuid,
    /// The transcribed text.
    pub text: String,
    /// When the transcription completed.
    pub created_at: SystemTime,
}

impl Transcript {
    pub(crate) fn new(text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            created_at: SystemTime::now(),
        }
    }
}
