use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use taleweaver::config::Config;
use taleweaver::error::AppResult;
use taleweaver::server;
use taleweaver::story::StoryLibrary;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// taleweaver - an interactive bedtime story server
#[derive(Parser, Debug)]
#[command(name = "taleweaver")]
#[command(version = "0.1.0")]
#[command(about = "An interactive bedtime story server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server
    Server {
        /// Host to bind to (overrides SERVER_HOST env var)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides SERVER_PORT env var)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate story content and print a summary
    Check {
        /// Content directory to check (overrides STORY_CONTENT_DIR env var)
        #[arg(long)]
        content_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command {
        Commands::Server { host, port } => {
            // Override config with CLI args if provided
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);

            server::run_server(config, addr).await
        }
        Commands::Check { content_dir } => {
            let dir = content_dir.unwrap_or_else(|| config.story.content_dir.clone());
            check_content(&dir)
        }
    }
}

/// Load the story library the same way the server would and report on it.
fn check_content(dir: &Path) -> AppResult<()> {
    info!("Checking story content in {}...", dir.display());

    let library = StoryLibrary::load(dir)?;

    info!(
        "Content OK: {} scene(s), {} character(s), {} event(s)",
        library.scene_count(),
        library.character_count(),
        library.event_count()
    );
    for scene in library.scenes() {
        info!(
            "  {} - \"{}\" ({} event(s))",
            scene.id,
            scene.title,
            scene.events.len()
        );
    }

    Ok(())
}
