use crate::config::default_latency_ms;

use serde::{Deserialize, Serialize};
use vocap_core::ApiScenario;

/// Simulated transcription backend configuration.
///
/// The scenario is the persisted form of the runtime knob; the app saves
/// it back here whenever the user changes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Which result the backend produces.
    #[serde(default = "default_scenario")]
    pub scenario: ApiScenario,

    /// Simulated round-trip latency in milliseconds (clamped to
    /// 500-2000 by the service).
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            scenario: default_scenario(),
            latency_ms: default_latency_ms(),
        }
    }
}

fn default_scenario() -> ApiScenario {
    ApiScenario::Success
}
