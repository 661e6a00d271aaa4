//! slotkeeper - book table time slots from the terminal.
//!
//! Logs in against the reservation API, keeps the session alive by
//! refreshing tokens behind the scenes, and lists, creates, edits and
//! deletes reservations.

mod commands;
mod display;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use slotkeeper_core::{ApiClient, Config};

#[derive(Debug, Parser)]
#[command(name = "slotkeeper", version, about = "Book table time slots from the terminal")]
pub struct Cli {
    /// API base URL (overrides config and SLOTKEEPER_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(long, env = "SLOTKEEPER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and log in with it
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
    },
    /// End the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show session state
    Status {
        /// Ask the server whether the stored session is still valid
        #[arg(long)]
        verify: bool,
    },
    /// List your reservations
    List,
    /// Reserve a time slot
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        /// Start, e.g. 2025-03-01T18:00
        #[arg(long)]
        start: String,
        /// End, e.g. 2025-03-01T18:30
        #[arg(long)]
        end: String,
    },
    /// Change a reservation; omitted fields keep their current value
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Delete one or more reservations
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}

/// Initialize the tracing subscriber for logging.
/// Returns the writer guard when logging to a file; keep it alive until exit.
fn init_tracing(log_file: Option<&PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "slotkeeper.log".into());
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };
    let stderr_layer = file_layer.is_none().then(|| fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_ref());

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", commands::describe_error(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    info!(api = %config.api_base_url, backend = ?config.credential_backend, "slotkeeper starting");

    let api = ApiClient::from_config(&config)?;
    commands::dispatch(cli.command, &api, &mut config).await
}
