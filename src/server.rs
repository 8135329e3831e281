//! Server startup, shutdown, and sweeper spawning logic.
//!
//! This module contains the `run_server` function which handles:
//! - Story content loading
//! - Application state creation
//! - Router creation
//! - Server binding and graceful shutdown
//! - Session sweeper spawning and cleanup

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::jobs::{create_shutdown_channel, Sweeper, SweeperConfig};
use crate::routes;
use crate::state::{AppState, SessionStore};
use crate::story::StoryLibrary;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Run the web server with the given configuration.
///
/// Loads and validates the story content, creates the application state,
/// sets up the router, and serves until a shutdown signal arrives.
///
/// # Arguments
///
/// * `config` - The application configuration
/// * `addr` - The address to bind the server to (e.g., "127.0.0.1:8000")
///
/// # Errors
///
/// This function will return an error if:
/// - Story content is missing or malformed
/// - The CORS policy is invalid
/// - Server binding fails
/// - Server runtime error occurs
pub async fn run_server(config: Config, addr: String) -> AppResult<()> {
    info!("Starting taleweaver server...");

    // Load story content; a broken library is a startup failure, not
    // something to limp along without
    info!(
        "Loading story content from {}...",
        config.story.content_dir.display()
    );
    let library = StoryLibrary::load(&config.story.content_dir)?;

    // Create application state
    let state = Arc::new(AppState {
        library,
        sessions: SessionStore::new(config.story.max_sessions),
    });

    // Start the session sweeper in a separate task
    let (sweeper_stop, sweeper_signal) = create_shutdown_channel();
    let sweeper = Sweeper::new(state.clone(), sweeper_signal).with_config(SweeperConfig {
        sweep_interval: std::time::Duration::from_secs(60),
        session_ttl: chrono::Duration::minutes(config.story.session_ttl_minutes),
    });
    let sweeper_handle = tokio::spawn(sweeper.run());

    // Create router
    let app = routes::create_router(state, &config.cors, &config.story)?;

    // Start server
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);
    info!("Story routes mounted under {}", config.story.route_prefix);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(create_shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    // Stop the sweeper and wait for it to finish
    let _ = sweeper_stop.send(true);
    sweeper_handle.await.unwrap_or_else(|e| {
        error!("Sweeper task failed: {:?}", e);
    });

    info!("Server shutdown complete");
    Ok(())
}

/// Create a future that resolves when a shutdown signal is received.
///
/// On Unix-like systems, this listens for both Ctrl+C (SIGINT) and SIGTERM.
/// On other platforms, it only listens for Ctrl+C.
///
/// # Panics
///
/// Panics if signal handler installation fails, since without working signal
/// handlers the process cannot be shut down gracefully at all.
async fn create_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
