//! travel-companion: main binary
//!
//! Usage:
//!   travel-companion                 - Start the web UI server
//!   travel-companion --image <path>  - Identify one photo and print the weather
//!   travel-companion --help          - Show help

mod oneshot;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tc_api::AppState;
use tc_core::{Config, Orchestrator, SessionManager, VertexClient};
use tracing_subscriber::EnvFilter;

/// How often idle sessions are swept
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// Web UI server
    Server,
    /// Identify a single image file
    OneShot(PathBuf),
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1))?;

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("travel-companion {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting travel-companion...");
    tracing::info!(
        "Project: {}, region: {}, model: {}",
        config.vertex.project_id,
        config.vertex.region,
        config.vertex.model
    );

    let client = VertexClient::new(&config.vertex)
        .map_err(|e| anyhow::anyhow!("Failed to create Vertex AI client: {}", e))?;
    let orchestrator = Orchestrator::with_client(client);

    match mode {
        RunMode::OneShot(path) => oneshot::run(&orchestrator, &path).await,
        RunMode::Server => run_server(config, orchestrator).await,
        _ => Ok(()),
    }
}

/// Parse command line arguments
fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<RunMode> {
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--image" | "-i" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--image requires a path"))?;
                return Ok(RunMode::OneShot(PathBuf::from(path)));
            }
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    Ok(RunMode::Server)
}

/// Print help message
fn print_help() {
    println!("travel-companion - identify a place from a photo and get its weather");
    println!();
    println!("Usage:");
    println!("  travel-companion                 Start the web UI server");
    println!("  travel-companion --image <path>  Identify one photo (jpg, jpeg, png)");
    println!("  travel-companion --help          Show this help message");
    println!("  travel-companion --version       Show version");
    println!();
    println!("Environment Variables:");
    println!("  PROJECT_ID           Google Cloud project (required)");
    println!("  REGION               Vertex AI region (required)");
    println!("  MODEL                Model name (default: gemini-1.5-flash-001)");
    println!("  VERTEX_ACCESS_TOKEN  OAuth token (default: gcloud auth print-access-token)");
    println!("  VERTEX_BASE_URL      Custom API endpoint");
    println!("  HOST / PORT          Listen host name or IP and port (default: 127.0.0.1:8501)");
    println!("  MAX_UPLOAD_BYTES     Largest accepted upload (default: 20 MiB)");
    println!("  SESSION_TTL_SECS     Idle session lifetime (default: 3600)");
}

/// Run the web UI server until Ctrl+C
async fn run_server(config: Config, orchestrator: Orchestrator) -> anyhow::Result<()> {
    tracing::info!("Press Ctrl+C to exit");
    serve_until(config, orchestrator, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    })
    .await
}

/// Serve until `shutdown` resolves; a server failure ends the run with its error
async fn serve_until(
    config: Config,
    orchestrator: Orchestrator,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let sessions = Arc::new(SessionManager::new());
    let state = AppState::new(orchestrator, Arc::clone(&sessions));

    let ttl = Duration::from_secs(config.server.session_ttl_secs);
    let sweeper_sessions = Arc::clone(&sessions);
    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sweeper_sessions.prune_idle(ttl).await;
        }
    });

    let result = tokio::select! {
        result = tc_api::start_server(&config.server, state) => {
            result.map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))
        }
        _ = shutdown => {
            tracing::info!("Shutting down...");
            Ok(())
        }
    };

    sweeper.abort();

    tracing::info!("Shutdown complete ({} sessions dropped)", sessions.count().await);
    result
}
