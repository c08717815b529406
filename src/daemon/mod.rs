//! Daemon mode for shortsmith - runs the pipeline orchestrator behind an
//! IPC server so clients can submit jobs and poll status.

pub mod handler;

use crate::config::Config;
use crate::error::{Result, ShortsmithError};
use crate::ipc::server::IpcServer;
use crate::media::{MediaComposer, SystemCommandRunner, video};
use crate::pipeline::{Orchestrator, OutputLayout, ProviderSet};
use crate::providers::{ElevenLabsGenerator, RunwayGenerator, RytrGenerator, SunoGenerator};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;

/// Daemon state: the orchestrator plus a shutdown signal the command
/// handler can trip.
pub struct DaemonState {
    pub orchestrator: Orchestrator,
    pub shutdown: Notify,
}

impl DaemonState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            shutdown: Notify::new(),
        }
    }
}

/// Wire the four real providers and the composer from configuration.
///
/// Fails fast on missing credentials so a job doesn't run half a pipeline
/// before discovering an unusable stage.
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    for (key, value) in [
        ("RYTR_API_KEY", &config.providers.script.api_key),
        ("ELEVENLABS_API_KEY", &config.providers.voice.api_key),
        ("SUNO_API_KEY", &config.providers.music.api_key),
        ("RUNWAY_API_KEY", &config.providers.video.api_key),
    ] {
        if value.is_empty() {
            return Err(ShortsmithError::MissingCredential {
                key: key.to_string(),
            });
        }
    }

    let runner = Arc::new(SystemCommandRunner::new());

    let providers = ProviderSet {
        script: Arc::new(
            RytrGenerator::new(config.providers.script.api_key.clone())?
                .with_base_url(config.providers.script.base_url.clone()),
        ),
        voice: Arc::new(
            ElevenLabsGenerator::new(config.providers.voice.api_key.clone())?
                .with_base_url(config.providers.voice.base_url.clone())
                .with_model_id(config.providers.voice.model_id.clone())
                .with_voice_settings(
                    config.providers.voice.stability,
                    config.providers.voice.similarity_boost,
                ),
        ),
        music: Arc::new(
            SunoGenerator::new(config.providers.music.api_key.clone(), runner.clone())?
                .with_base_url(config.providers.music.base_url.clone()),
        ),
        video: Arc::new(
            RunwayGenerator::new(config.providers.video.api_key.clone(), runner.clone())?
                .with_base_url(config.providers.video.base_url.clone()),
        ),
    };

    let composer = MediaComposer::new(runner.clone())
        .with_music_gain_db(config.compose.music_gain_db)
        .with_caption_position(config.compose.caption_position);

    Ok(Orchestrator::new(
        providers,
        composer,
        runner,
        OutputLayout::new(&config.output.dir),
    ))
}

/// Run the daemon: wire providers, start the IPC server, wait for shutdown.
///
/// # Arguments
/// * `config` - Configuration
/// * `socket_path` - Path to Unix socket for IPC
/// * `quiet` - Suppress status messages
///
/// # Returns
/// Ok(()) on graceful shutdown, error otherwise
pub async fn run_daemon(config: Config, socket_path: Option<PathBuf>, quiet: bool) -> Result<()> {
    // ffmpeg is needed at composition time; refuse to start without it
    let runner = SystemCommandRunner::new();
    video::check_prerequisites(&runner).await?;

    let orchestrator = build_orchestrator(&config)?;
    let state = Arc::new(DaemonState::new(orchestrator));

    // Determine socket path
    let socket_path = socket_path.unwrap_or_else(IpcServer::default_socket_path);

    // Create IPC server
    let server = Arc::new(IpcServer::new(socket_path)?);

    if !quiet {
        eprintln!(
            "IPC server listening at: {}",
            server.socket_path().display()
        );
        eprintln!("shortsmith {} ready.", crate::version_string());
    }
    tracing::info!(socket = %server.socket_path().display(), "daemon started");

    // Create command handler
    let handler = handler::DaemonCommandHandler::new(Arc::clone(&state));

    // Start IPC server in background task
    let server_clone = Arc::clone(&server);
    let server_handle = tokio::spawn(async move { server_clone.start(handler).await });

    // Wait for SIGTERM, SIGINT or a shutdown command
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            if !quiet {
                eprintln!("\nReceived SIGINT, shutting down...");
            }
        }
        res = wait_for_sigterm() => {
            if let Err(e) = res {
                tracing::error!(error = %e, "error setting up signal handler");
            }
            if !quiet {
                eprintln!("\nReceived SIGTERM, shutting down...");
            }
        }
        _ = state.shutdown.notified() => {
            if !quiet {
                eprintln!("Shutdown requested over IPC...");
            }
        }
    }

    // Stop IPC server
    server.stop().await?;

    // Wait for server task to finish
    if let Err(e) = server_handle.await {
        tracing::error!(error = %e, "daemon server task failed");
    }

    if !quiet {
        eprintln!("Daemon stopped.");
    }

    Ok(())
}

/// Wait for SIGTERM signal (used by systemd).
#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
        ShortsmithError::Other(format!("Failed to register SIGTERM handler: {}", e))
    })?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    // On non-Unix, just wait forever (Ctrl+C will still work)
    std::future::pending::<()>().await
}
