//! Live football odds processor entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use odds_processor::api::{create_router, AppState};
use odds_processor::config::Config;
use odds_processor::consumer::QueueConsumer;
use odds_processor::registry::TeamRegistry;
use odds_processor::store::{MatchStore, PgMatchStore};
use odds_processor::utils::shutdown_signal;

/// Live football odds processor.
#[derive(Parser, Debug)]
#[command(name = "odds-processor")]
#[command(about = "Consumes bookmaker final-score odds and persists normalized match-outcome odds")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the processing service (default).
    Run,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("odds_processor=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Run) | None => cmd_run().await,
    }
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("ODDS PROCESSOR - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Exchange: {}", config.amqp_exchange);
    println!("  Queue: {}", config.amqp_queue);
    println!("  Teams File: {}", config.teams_file);
    println!("  HTTP Port: {}", config.port);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the processing service.
async fn cmd_run() -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    // Team reference data, built once and shared read-only.
    let registry = Arc::new(TeamRegistry::load(&config.teams_file));
    if registry.is_empty() {
        warn!(file = %config.teams_file, "team registry is empty, every entry will be skipped");
    } else {
        info!(teams = registry.len(), "team registry loaded");
    }

    // Connect to the store; unreachable database is startup-fatal.
    let store = PgMatchStore::connect(&config.database_url).await?;
    store.ensure_schema().await?;
    let store: Arc<dyn MatchStore> = Arc::new(store);

    // Start HTTP server
    let app_state = AppState::new(Arc::clone(&store));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    // Connect the consumer; unreachable broker is startup-fatal.
    let consumer = QueueConsumer::connect(&config, registry, store).await?;
    app_state.set_ready(true);

    info!("========================================");
    info!("ODDS PROCESSOR STARTED");
    info!("========================================");
    info!("Exchange: {}", config.amqp_exchange);
    info!("Queue: {}", config.amqp_queue);
    info!("========================================");

    consumer.run(shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}
