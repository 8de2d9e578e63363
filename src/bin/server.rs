//! Game server binary.
//!
//! Serves the WebSocket endpoint for live matches plus health and
//! stats routes.

use clap::Parser;

/// Realtime Connect Four server.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: String,
    /// Number of HTTP worker threads.
    #[arg(long, default_value_t = 4)]
    workers: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    connect4::log();
    connect4::kys();
    connect4::hosting::Server::run(&args.bind, args.workers).await?;
    Ok(())
}
