use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Simulated outcome of the platform microphone permission prompt,
/// injected at recorder construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionPolicy {
    /// Access was granted previously; no prompt is needed.
    Granted,
    /// The first prompt grants access.
    PromptThenGrant,
    /// The first prompt denies access.
    PromptThenDeny,
}

/// Remembers the user's permission decision so repeated prompts are
/// idempotent.
#[derive(Debug)]
pub(crate) struct PermissionGate {
    policy: PermissionPolicy,
    decision: Option<bool>,
}

impl PermissionGate {
    pub(crate) fn new(policy: PermissionPolicy) -> Self {
        Self {
            policy,
            decision: None,
        }
    }

    /// Non-mutating probe: true only once access is known to be granted.
    pub(crate) fn granted(&self) -> bool {
        match self.policy {
            PermissionPolicy::Granted => true,
            _ => self.decision == Some(true),
        }
    }

    /// Prompt the user if no decision is recorded yet; otherwise return
    /// the remembered decision.
    pub(crate) fn request(&mut self) -> bool {
        if let Some(decision) = self.decision {
            debug!(granted = decision, "Permission already decided, skipping prompt");
            return decision;
        }

        let granted = match self.policy {
            PermissionPolicy::Granted | PermissionPolicy::PromptThenGrant => true,
            PermissionPolicy::PromptThenDeny => false,
        };

        self.decision = Some(granted);
        info!(granted, "Microphone permission prompt answered");

        granted
    }
}
