//! reflection-daemon: core of the emotion reflection tool
//!
//! Hosts the reflection state behind a local socket so any front end can
//! drive it:
//! - Text buffer and dictation sessions (typed or spoken reflections)
//! - Submission lifecycle against the remote classification service
//! - Session history of results, newest first
//! - IPC for snapshots, actions and state event pushes
//!
//! Nothing is persisted; history lives for the life of the process.

mod classify;
mod config;
mod events;
mod ipc;
mod lifecycle;
mod speech;
mod state;
mod view;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::classify::HttpClassifier;
use crate::config::Config;
use crate::events::StateEvent;
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::speech::SpeechCapability;
use crate::state::StateMachine;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "reflection-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, "configuration loaded");

    let shutdown = ShutdownSignal::new();

    let classifier = HttpClassifier::new(config.classifier_url.clone(), config.request_timeout)?;
    info!(endpoint = classifier.endpoint(), "classification service configured");

    let speech: Option<Arc<dyn SpeechCapability>> = match config.speech.clone() {
        Some(command) => {
            info!(program = command.program(), "speech capability configured");
            Some(Arc::new(command) as Arc<dyn SpeechCapability>)
        }
        None => {
            warn!("no speech command configured, dictation unsupported");
            None
        }
    };

    // IPC server -> state machine
    let (command_tx, command_rx) = mpsc::channel(32);
    // State machine -> subscribed clients
    let (event_tx, _event_rx) = broadcast::channel::<StateEvent>(64);

    let mut state_machine = StateMachine::new(Arc::new(classifier), speech, event_tx.clone());

    let server = Server::new(&config.socket_path, command_tx, event_tx)?;

    info!("daemon initialized, entering main loop");

    tokio::select! {
        _ = state_machine.run(command_rx) => {
            info!("state machine exited");
        }

        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");

    server.shutdown().await;

    info!("reflection-daemon stopped");

    Ok(())
}
