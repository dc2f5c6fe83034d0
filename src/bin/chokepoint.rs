//! chokepoint CLI: runs the capacity-limited worker service.

use std::net::SocketAddr;
use std::sync::Arc;

use chokepoint::config::Config;
use chokepoint::server;
use chokepoint::service::WorkService;
use chokepoint::telemetry::init_tracing;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "chokepoint",
    about = "Deliberately capacity-limited worker service"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the worker service
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { addr } => cmd_serve(addr).await,
    }
}

async fn cmd_serve(addr: SocketAddr) -> anyhow::Result<()> {
    init_tracing()?;

    let config = Config::from_env()?;
    info!(
        delay_ms = config.delay_ms,
        fail_rate = config.fail_rate,
        "starting chokepoint"
    );

    let service = Arc::new(WorkService::new(config)?);

    // Bounds cache memory; lookup re-checks expiry regardless.
    tokio::spawn(Arc::clone(&service).run_sweeper());

    server::serve(service, addr).await?;
    Ok(())
}
