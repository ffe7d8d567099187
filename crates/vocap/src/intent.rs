use std::str::FromStr;

use vocap_core::ApiScenario;

/// User intents emitted by the console front end.
///
/// The controller treats every intent as fire-and-forget; intents invalid
/// for the current state are swallowed there, so parsing is the only
/// failure mode here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Begin a capture (press).
    Start,
    /// End the capture and transcribe (release).
    Stop,
    /// Abandon the capture in progress.
    Cancel,
    /// Acknowledge an error or permission notice.
    Dismiss,
    /// Re-run the permission flow after a denial.
    Retry,
    /// Select the simulated backend's behavior.
    SetScenario(ApiScenario),
    /// Print the transcript history.
    ShowHistory,
    /// Exit the application.
    Quit,
}

impl Intent {
    /// Parse one console line into an intent.
    ///
    /// # Errors
    ///
    /// Returns a usage message for unknown commands or scenarios.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or("").to_ascii_lowercase();
        let argument = words.next();

        match (command.as_str(), argument) {
            ("start", None) => Ok(Intent::Start),
            ("stop", None) => Ok(Intent::Stop),
            ("cancel", None) => Ok(Intent::Cancel),
            ("dismiss", None) => Ok(Intent::Dismiss),
            ("retry", None) => Ok(Intent::Retry),
            ("history", None) => Ok(Intent::ShowHistory),
            ("quit", None) | ("exit", None) => Ok(Intent::Quit),
            ("scenario", Some(name)) => ApiScenario::from_str(name).map(Intent::SetScenario),
            ("scenario", None) => {
                Err("Usage: scenario <success|clarify|network_error|server_error>".to_string())
            }
            ("", _) => Err("Commands: start, stop, cancel, dismiss, retry, scenario <name>, \
                            history, quit"
                .to_string()),
            (other, _) => Err(format!("Unknown command '{}'", other)),
        }
    }
}
