use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use message_board::{board::Board, cli::Cli, config::BoardConfig};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = BoardConfig::from(Cli::parse());
    let board = Board::bind(&config).await?;
    info!(store = %config.store_path.display(), assets = %config.assets_dir.display(), "board configured");
    info!("relay listening on {}", board.relay_addr()?);
    info!("serving HTTP on {}", board.web_addr()?);

    if let Err(err) = board.run_until_ctrl_c().await {
        warn!("board exited with error: {err:?}");
        return Err(err);
    }

    Ok(())
}
