use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Result, bail};

use crate::cli::Cli;

/// Everything the board needs to start, handed to each component explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub web_addr: SocketAddr,
    pub relay_addr: SocketAddr,
    pub store_path: PathBuf,
    pub assets_dir: PathBuf,
}

impl BoardConfig {
    /// The relay is a same-host channel and must never be reachable from outside.
    pub fn validate(&self) -> Result<()> {
        if !self.relay_addr.ip().is_loopback() {
            bail!(
                "relay address {} is not a loopback address",
                self.relay_addr
            );
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            web_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            relay_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            store_path: PathBuf::from("storage/data.json"),
            assets_dir: PathBuf::from("static"),
        }
    }
}

impl From<Cli> for BoardConfig {
    fn from(cli: Cli) -> Self {
        Self {
            web_addr: cli.web_addr,
            relay_addr: cli.relay_addr,
            store_path: cli.store_path,
            assets_dir: cli.assets_dir,
        }
    }
}
