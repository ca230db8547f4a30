use std::{future::Future, net::SocketAddr};

use anyhow::{Context, Result};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    assets::StaticAssets,
    config::BoardConfig,
    http::{self, AppState},
    relay::{RelayListener, RelaySender},
    store::JsonStore,
};

/// Both sockets, bound and ready: the relay listener and the HTTP server.
pub struct Board {
    http: TcpListener,
    listener: RelayListener,
    assets: StaticAssets,
}

impl Board {
    /// Binds the relay first so the sender can target its actual address,
    /// which matters when the configured port is 0.
    pub async fn bind(config: &BoardConfig) -> Result<Self> {
        config.validate()?;

        let listener =
            RelayListener::bind(config.relay_addr, JsonStore::new(&config.store_path)).await?;
        let http = TcpListener::bind(config.web_addr)
            .await
            .with_context(|| format!("failed to bind HTTP server on {}", config.web_addr))?;

        Ok(Self {
            http,
            listener,
            assets: StaticAssets::new(&config.assets_dir),
        })
    }

    pub fn web_addr(&self) -> std::io::Result<SocketAddr> {
        self.http.local_addr()
    }

    pub fn relay_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves HTTP until `shutdown` resolves, then stops the relay listener.
    ///
    /// Datagrams already queued in the socket when the listener stops are lost.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Board {
            http,
            listener,
            assets,
        } = self;

        let relay = RelaySender::new(listener.local_addr()?);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let listener_task = spawn_listener(listener, stop_rx);

        let app = http::router(AppState::new(assets, relay));
        let served = axum::serve(http, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed");

        info!("HTTP server stopped");
        let _ = stop_tx.send(());
        match listener_task.await {
            Ok(result) => result?,
            Err(err) => warn!(error = ?err, "relay listener task failed"),
        }

        served
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

fn spawn_listener(listener: RelayListener, stop: oneshot::Receiver<()>) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        listener
            .run_until(async move {
                let _ = stop.await;
            })
            .await
    })
}
