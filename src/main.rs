// Zenith Crisis - Crisis detection and alert dispatch
// Main entry point

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

use zenith_crisis::config::load_config;
use zenith_crisis::crisis::CrisisDetector;
use zenith_crisis::server::AlertServer;

#[derive(Parser, Debug)]
#[command(name = "zenith-crisis")]
#[command(about = "Crisis detection and alert dispatch service", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run the HTTP alert server
    Serve {
        /// Bind address; overrides the configured value
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run the crisis classifier over a piece of text and print the verdict
    Scan {
        /// Text to classify
        text: String,

        /// Path to a JSON phrase list overriding the built-in one
        #[arg(long = "phrases")]
        phrases: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    match args.command {
        Command::Serve { bind } => run_serve(bind).await,
        Command::Scan { text, phrases } => run_scan(&text, phrases.as_deref()),
    }
}

fn init_tracing() {
    // Default: INFO level, can be overridden with RUST_LOG env var
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load config and serve until SIGINT/SIGTERM.
///
/// Configuration problems (missing credentials, empty recipient list) are
/// fatal here, before the listener ever binds.
async fn run_serve(bind: Option<String>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }

    tracing::info!(
        recipients = config.recipients.len(),
        origins = config.server.allowed_origins.len(),
        "Configuration loaded"
    );

    let server = AlertServer::from_config(&config)?;
    server.serve().await
}

fn run_scan(text: &str, phrases: Option<&std::path::Path>) -> Result<()> {
    let detector = match phrases {
        Some(path) => CrisisDetector::load_from_file(path)?,
        None => CrisisDetector::default(),
    };

    if detector.is_crisis(text) {
        println!("crisis: matched one of {} phrases", detector.phrases().len());
    } else {
        println!("no match");
    }

    Ok(())
}
