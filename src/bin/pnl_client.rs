//! Status client for the simulator's monitoring API
//!
//! Usage:
//! ```bash
//! cargo run --bin pnl_client -- <pnl|summary|trades|health> [--host localhost:8080] [--limit 10]
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};

use hft_arb::client::{
    render_health, render_pnl, render_summary, render_trades, StatusClient, DEFAULT_HOST,
};
use hft_arb::server::DEFAULT_TRADE_LIMIT;

#[derive(Parser, Debug)]
#[command(name = "pnl_client")]
#[command(about = "Query the arbitrage simulator's monitoring API")]
struct Args {
    /// API address as HOST:PORT
    #[arg(long, global = true, default_value = DEFAULT_HOST)]
    host: String,

    /// Number of trades for `trades`
    #[arg(long, global = true, default_value_t = DEFAULT_TRADE_LIMIT)]
    limit: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Full P&L status
    Pnl,
    /// One-line summary
    Summary,
    /// Most recent trade legs
    Trades,
    /// Server liveness and uptime
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let client = StatusClient::new(&args.host).context("failed to build HTTP client")?;
    let output = match args.command {
        Command::Pnl => render_pnl(&client.pnl().await.context("GET /pnl failed")?),
        Command::Summary => {
            render_summary(&client.summary().await.context("GET /summary failed")?)
        }
        Command::Trades => render_trades(
            &client
                .trades(args.limit)
                .await
                .context("GET /trades failed")?,
        ),
        Command::Health => render_health(&client.health().await.context("GET /health failed")?),
    };
    print!("{}", output);
    Ok(())
}
