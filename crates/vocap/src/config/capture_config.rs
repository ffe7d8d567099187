use crate::config::{default_expire_ms, default_tick_interval_ms};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use vocap_core::PermissionPolicy;

/// Capture controller and recorder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Directory for recording files (None = platform data dir).
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    /// How often the listening elapsed time is refreshed.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// How long results and clarifications stay on screen.
    #[serde(default = "default_expire_ms")]
    pub expire_ms: u64,

    /// Simulated outcome of the microphone permission prompt.
    #[serde(default = "default_permission")]
    pub permission: PermissionPolicy,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            tick_interval_ms: default_tick_interval_ms(),
            expire_ms: default_expire_ms(),
            permission: default_permission(),
        }
    }
}

fn default_permission() -> PermissionPolicy {
    PermissionPolicy::PromptThenGrant
}
