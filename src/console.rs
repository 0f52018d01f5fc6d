//! Operator console: line commands on stdin, answered from the live ledger.
//!
//! Stdin is read on a plain OS thread and forwarded over a channel. A tokio
//! `Stdin` read cannot be cancelled, so reading it on the blocking pool would
//! keep the runtime alive after Ctrl+C until the operator pressed Enter.

use std::io::BufRead;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::client::{render_pnl, render_trades};
use crate::core::ledger::ExecutionLedger;

/// Trades shown by the `trades` command
pub const RECENT_TRADES: i64 = 10;

pub const HELP: &str = "Available commands:
  Enter  - Check P&L status
  pnl    - Check P&L status
  trades - Show recent trade history
  help   - Show this help
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Status,
    Trades,
    Help,
    Unknown,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "pnl" | "p&l" | "status" => ConsoleCommand::Status,
            "trades" | "history" => ConsoleCommand::Trades,
            "help" => ConsoleCommand::Help,
            _ => ConsoleCommand::Unknown,
        }
    }
}

/// Response text for one input line
pub fn handle_command(line: &str, ledger: &ExecutionLedger) -> String {
    match ConsoleCommand::parse(line) {
        ConsoleCommand::Status => render_pnl(&ledger.current_status()),
        ConsoleCommand::Trades => render_trades(&ledger.trade_history(RECENT_TRADES)),
        ConsoleCommand::Help => HELP.to_string(),
        ConsoleCommand::Unknown => format!(
            "Unknown command: {}. Type 'help' for available commands.\n",
            line.trim()
        ),
    }
}

/// Forward stdin lines from a detached reader thread.
///
/// The channel closes on EOF or a read error.
pub fn stdin_lines(capacity: usize) -> std::io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(capacity);
    std::thread::Builder::new()
        .name("console-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Answer each incoming line on `writer` until shutdown or end of input.
pub async fn run_console<W>(
    mut lines: mpsc::Receiver<String>,
    mut writer: W,
    ledger: Arc<ExecutionLedger>,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    info!("[CONSOLE] Ready. Press Enter for P&L, type 'help' for commands");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("[CONSOLE] Shutdown received");
                return Ok(());
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    debug!("[CONSOLE] Input closed");
                    return Ok(());
                };
                let reply = handle_command(&line, &ledger);
                writer.write_all(reply.as_bytes()).await?;
                writer.flush().await?;
            }
        }
    }
}
