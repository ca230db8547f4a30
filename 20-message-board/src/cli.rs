use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address the HTTP server binds to. Use port 0 for an ephemeral port.
    #[arg(long, env = "BOARD_WEB_ADDR", default_value = "0.0.0.0:3000")]
    pub web_addr: SocketAddr,

    /// Loopback address of the internal relay listener.
    #[arg(long, env = "BOARD_RELAY_ADDR", default_value = "127.0.0.1:5000")]
    pub relay_addr: SocketAddr,

    /// JSON file holding every stored entry.
    #[arg(long, env = "BOARD_STORE_PATH", default_value = "storage/data.json")]
    pub store_path: PathBuf,

    /// Directory containing the HTML pages and static files.
    #[arg(long, env = "BOARD_ASSETS_DIR", default_value = "static")]
    pub assets_dir: PathBuf,
}
