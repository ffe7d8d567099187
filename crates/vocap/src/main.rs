//! Vocap: press-to-talk voice capture console with a simulated
//! transcription backend.

mod app;
mod config;
mod error;
mod intent;

pub(crate) use {
    app::App,
    error::{AppError, Result as AppResult},
    intent::Intent,
};

use crate::config::Config;

use std::{io::BufRead, sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use vocap_core::{CaptureController, ControllerConfig, Recorder, TranscriptionService};

/// Recordings older than this are swept at startup.
const STALE_RECORDING_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Resolve the storage directory and construct the recorder.
fn build_recorder(config: &Config) -> AppResult<Recorder> {
    let storage_dir = config.storage_dir()?;
    let recorder = Recorder::new(storage_dir, config.capture.permission)?;
    Ok(recorder)
}

/// Application entry point.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("vocap=debug")
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let recorder = match build_recorder(&config) {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to create recorder: {:?}", e);
            std::process::exit(1);
        }
    };

    // Startup hygiene: drop captures orphaned by earlier runs.
    let removed = recorder.cleanup_stale(STALE_RECORDING_MAX_AGE);
    if removed > 0 {
        info!(removed, "Removed stale recordings from previous runs");
    }

    let service = TranscriptionService::with_latency(
        config.service.scenario,
        Duration::from_millis(config.service.latency_ms),
    );

    let controller = Arc::new(CaptureController::new(
        recorder,
        service,
        ControllerConfig {
            tick_interval: Duration::from_millis(config.capture.tick_interval_ms),
            expire_after: Duration::from_millis(config.capture.expire_ms),
        },
    ));

    let (intent_tx, intent_rx) = mpsc::channel(32);

    // Single persistent blocking task that forwards stdin intents.
    // std::io::Stdin has blocking line reads -- zero polling, one thread.
    //
    // Shutdown: when intent_rx is dropped (app loop ends), the next
    // intent_tx.blocking_send() fails, breaking the blocking loop. The
    // JoinHandle is awaited with a timeout after the app exits.
    let reader = tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match Intent::parse(&line) {
                Ok(intent) => {
                    let quit = intent == Intent::Quit;
                    if intent_tx.blocking_send(intent).is_err() || quit {
                        break;
                    }
                }
                Err(usage) => eprintln!("{}", usage),
            }
        }
        // EOF behaves like quit so a piped session terminates cleanly.
        let _ = intent_tx.blocking_send(Intent::Quit);
    });

    let app = App {
        controller,
        config,
        intent_rx,
    };

    if let Err(e) = app.run().await {
        error!(error = ?e, "App error");
    }

    // Best-effort join: the blocking task may be stuck in a line read if
    // stdin never closes. Use a timeout to avoid hanging; the task is
    // cleaned up by the runtime on process exit regardless.
    match tokio::time::timeout(Duration::from_secs(1), reader).await {
        Ok(Ok(())) => info!("Intent forwarder stopped cleanly"),
        Ok(Err(e)) => warn!(error = ?e, "Intent forwarder task panicked"),
        Err(_) => info!(
            "Intent forwarder did not stop within timeout, \
             will be cleaned up on exit"
        ),
    }
}
