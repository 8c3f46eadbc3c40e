//! Parley CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP gateway
//! - `chat`: Interactive client for a running gateway
//! - `status`: Show effective configuration
//! - `onboard`: Write a default config file

use clap::{Parser, Subcommand};

mod client;
mod commands;

#[derive(Parser)]
#[command(
    name = "parley",
    about = "Parley: per-user conversational context service",
    version,
    author
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
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind host
        #[arg(long)]
        host: Option<String>,
    },

    /// Chat with a running gateway
    Chat {
        /// Gateway base URL (defaults to client.base_url from config)
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Show effective configuration
    Status,

    /// Write a default configuration file
    Onboard,
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
        Commands::Serve { port, host } => commands::gateway::run(port, host).await?,
        Commands::Chat { url } => commands::chat::run(url).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Onboard => commands::onboard::run().await?,
    }

    Ok(())
}
