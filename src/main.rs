//! Bé Vui Học - timed AI-generated quizzes for primary school students
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary initializes:
//! - Settings ([`ConfigManager`]: defaults, `Quiz Data/settings.yaml`, `BEVUIHOC__*` env)
//! - Logging infrastructure (file rotation + optional console output)
//! - Tokio async runtime (quiz sessions, content provider calls)
//! - The Gemini content provider and the audio playback thread
//! - State management ([`StateManager`]) and the GUI controller
//!
//! Threading model:
//! - **Main thread**: Runs the Slint event loop
//! - **Tokio workers**: One task per quiz session plus provider requests
//! - **Audio thread**: Owns the output device
//! - **State listener**: Background std::thread forwarding flow changes to the window
//!
//! # Credentials
//!
//! `API_KEY` (or `GEMINI_API_KEY`) must be set in the environment or in a
//! `.env` file; without it the application refuses to start.

use anyhow::{Context, Result};
use bevuihoc::config::load_api_key;
use bevuihoc::services::{AudioService, ContentProvider, GeminiProvider, create_audio_channel};
use bevuihoc::ui::{GuiController, QuizServices};
use bevuihoc::{APP_NAME, ConfigManager, QuizMetrics, StateManager, VERSION};
use std::sync::Arc;
use std::time::Duration;

const CONFIG_DIR: &str = "Quiz Data";

fn main() -> Result<()> {
    // A missing .env file is fine; the variables may come from the shell
    let dotenv = dotenvy::dotenv();

    // The log directory comes from settings, so they load before any subscriber exists
    let config_manager = ConfigManager::new(CONFIG_DIR)?;
    let loaded = config_manager.load_settings()?;
    let settings = loaded.settings;

    let _log_guard = bevuihoc::logging::setup_logging(&settings.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    if loaded.created_defaults {
        tracing::warn!(
            "Settings file not found, wrote defaults to {}",
            config_manager.settings_path()
        );
    }
    tracing::info!("Loaded settings from {}", config_manager.settings_path());
    match dotenv {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => tracing::warn!("Failed to read .env file: {}", e),
    }

    let api_key = load_api_key().inspect_err(|e| tracing::error!("{}", e))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("bevuihoc-worker")
        .build()
        .context("Failed to build tokio runtime")?;

    tracing::info!("Tokio runtime initialized with {} worker threads", 2);

    let provider: Arc<dyn ContentProvider> = Arc::new(
        GeminiProvider::new(api_key, settings.api.clone())
            .context("Failed to create content provider")?,
    );
    tracing::info!(
        "Content provider ready (quiz model: {}, speech model: {})",
        settings.api.quiz_model,
        settings.api.speech_model
    );

    let audio = if settings.audio.enabled {
        let (sender, rx) = create_audio_channel();
        match AudioService::new(rx, settings.audio.effective_volume()).spawn() {
            Ok(_) => Some(sender),
            Err(e) => {
                tracing::warn!("Failed to start audio thread, continuing without sound: {}", e);
                None
            }
        }
    } else {
        tracing::info!("Audio disabled in settings");
        None
    };

    let metrics = Arc::new(QuizMetrics::new());
    let state_manager = Arc::new(StateManager::new());

    let services = QuizServices {
        provider,
        audio,
        metrics: Arc::clone(&metrics),
    };

    let gui_controller = GuiController::new(state_manager, services, runtime.handle().clone())?;

    tracing::info!("GUI controller initialized, launching window");

    // Blocks until the window is closed; any running session is cancelled on return
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");

    runtime.shutdown_timeout(Duration::from_secs(5));
    metrics.log_summary();

    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
