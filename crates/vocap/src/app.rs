use crate::{AppResult, Intent, config::Config};

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};
use vocap_core::{CaptureController, CaptureState};

/// Main application state.
///
/// Runs the intent event loop: stdin lines arrive pre-parsed through
/// `intent_rx`, state transitions are rendered by a watch-subscribed
/// observer task. The app is a pure emitter of intents and observer of
/// state; all capture logic lives in the controller.
pub struct App {
    pub(crate) controller: Arc<CaptureController>,
    pub(crate) config: Config,
    pub(crate) intent_rx: mpsc::Receiver<Intent>,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Vocap starting");

        let mut state_rx = self.controller.state_receiver();
        let observer = tokio::spawn(async move {
            while state_rx.changed().await.is_ok() {
                let state = state_rx.borrow_and_update().clone();
                render(&state);
            }
        });

        while let Some(intent) = self.intent_rx.recv().await {
            if intent == Intent::Quit {
                info!("Shutdown requested");
                break;
            }
            if let Err(e) = self.handle_intent(intent).await {
                error!(error = ?e, "Failed to handle intent");
            }
        }

        // Backgrounding hook: never leave an orphaned capture behind.
        self.controller.request_cancel().await;

        observer.abort();
        info!("Vocap shut down successfully");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn handle_intent(&mut self, intent: Intent) -> AppResult<()> {
        match intent {
            Intent::Start => self.controller.request_start().await,
            Intent::Stop => self.controller.request_stop().await,
            Intent::Cancel => self.controller.request_cancel().await,
            Intent::Dismiss => match self.controller.current_state() {
                CaptureState::Error { .. } => self.controller.dismiss_error().await,
                CaptureState::PermissionDenied { .. } => {
                    self.controller.dismiss_permission_denied().await;
                }
                state => debug!(state = state.label(), "Nothing to dismiss"),
            },
            Intent::Retry => self.controller.retry_permission().await,
            Intent::SetScenario(scenario) => {
                self.controller.set_scenario(scenario).await;
                // The scenario knob is persisted across restarts.
                self.config.service.scenario = scenario;
                self.config.save()?;
                println!("Scenario set to {}", scenario);
            }
            Intent::ShowHistory => {
                let history = self.controller.history().await;
                if history.is_empty() {
                    println!("No transcripts yet.");
                }
                for entry in history {
                    println!("[{}] {}", entry.id, entry.text);
                }
            }
            Intent::Quit => {}
        }

        Ok(())
    }
}

/// Render one state transition as a console line.
fn render(state: &CaptureState) {
    match state {
        CaptureState::Idle => println!("Ready."),
        CaptureState::CheckingPermission => println!("Checking microphone permission..."),
        CaptureState::PermissionDenied { message } => println!("Permission denied: {}", message),
        CaptureState::Listening { elapsed_ms } => {
            println!("Listening... {:.1}s", *elapsed_ms as f64 / 1000.0);
        }
        CaptureState::Processing => println!("Transcribing..."),
        CaptureState::Result { transcript } => println!("Transcript: {}", transcript),
        CaptureState::Clarification { prompt, .. } => println!("Backend asks: {}", prompt),
        CaptureState::Error { message, kind } => println!("Error ({:?}): {}", kind, message),
    }
}
