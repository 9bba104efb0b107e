//! delcore node entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use delcore_config::Config;
use delcore_node::Node;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "delcore", version, about = "delcore delegate node")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the node
    Start {
        /// Path to the TOML configuration file
        #[arg(long, default_value = "delcore.toml")]
        config: PathBuf,
    },
}

fn init_tracing(directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Start { config } => {
            let config = Config::load(&config)?;
            init_tracing(&config.logging.level);

            let mut node = Node::new(config)?;
            node.start().await?;

            tokio::signal::ctrl_c().await?;
            info!("interrupt received, shutting down");
            node.shutdown().await;
        }
    }

    Ok(())
}
