//! IGS API server.
//!
//! Serves census-tract inclusive-growth scores to authenticated clients.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                   IGS API                    │
//!   POST /token ────────┼─▶ http::routes ──▶ auth::AuthService         │
//!                       │                       (argon2 + JWT)         │
//!   GET /tracts/... ────┼─▶ http::routes ──▶ require_bearer ──┐        │
//!                       │                                     ▼        │
//!                       │                             store::TractStore│
//!                       │                                (SQLite)      │
//!                       │                                     ▲        │
//!   igs-api seed ───────┼─▶ seed ──▶ security::sanitize ──────┘        │
//!                       │                                              │
//!                       │  config · observability · lifecycle          │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::io::BufRead;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use igs_api::auth::password::hash_password;
use igs_api::config::{self, ApiConfig};
use igs_api::http::ApiServer;
use igs_api::lifecycle::{self, signals, Shutdown};
use igs_api::observability::{self, logging};
use igs_api::seed;
use igs_api::store::TractStore;

#[derive(Parser)]
#[command(name = "igs-api")]
#[command(about = "Census tract inclusive-growth score API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "IGS_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the API (default)
    Serve,
    /// Load tracts into the record store and exit
    Seed {
        /// CSV files to load; defaults to the configured seed files, then the built-in dataset
        files: Vec<PathBuf>,
    },
    /// Read a password from stdin and print its argon2 hash for [[auth.users]]
    HashPassword,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::HashPassword => hash_from_stdin(),
        Commands::Seed { files } => {
            let config = config::load_config(cli.config.as_deref())?;
            logging::init_logging(&config.observability);
            run_seed(&config, files)
        }
        Commands::Serve => {
            let config = config::load_config(cli.config.as_deref())?;
            logging::init_logging(&config.observability);
            serve(config).await
        }
    }
}

async fn serve(config: ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("igs-api v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        database = %config.storage.database_path,
        request_timeout_secs = config.timeouts.request_secs,
        rate_limit = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let state = lifecycle::build_state(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = ApiServer::new(&config, state);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    signals::shutdown_on_signal(&shutdown).await;
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn run_seed(config: &ApiConfig, files: Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let store = TractStore::open(&config.storage.database_path)?;

    let report = if !files.is_empty() {
        seed::seed_files(&store, files.as_slice())?
    } else if !config.storage.seed_files.is_empty() {
        seed::seed_files(&store, config.storage.seed_files.as_slice())?
    } else {
        seed::seed_builtin(&store)?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn hash_from_stdin() -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Password (read from stdin):");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err("empty password".into());
    }

    println!("{}", hash_password(password)?);
    Ok(())
}
