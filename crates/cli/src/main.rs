//! ChatRelay CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the HTTP relay
//! - `chat`    — Run a single turn from the terminal
//! - `init`    — Write a default config
//! - `status`  — Show effective configuration
//! - `doctor`  — Diagnose configuration and store health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "chatrelay",
    about = "ChatRelay — session-aware relay to an LLM completion endpoint",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP relay server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send one message through the relay and print the result
    Chat {
        /// Session the message belongs to
        #[arg(short, long, default_value = "cli")]
        session: String,

        /// The message text
        #[arg(short, long)]
        message: String,
    },

    /// Create the config directory and a default config.toml
    Init,

    /// Show effective configuration
    Status,

    /// Diagnose configuration and store health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { session, message } => commands::chat::run(&session, &message).await?,
        Commands::Init => commands::init::run().await?,
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
