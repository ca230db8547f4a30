use std::{
    future::Future,
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use anyhow::{Context, Result};
use tokio::{net::UdpSocket, select};
use tracing::{debug, error, info, warn};

use crate::{
    entry::{self, Clock, Entry},
    frame::{self, FrameError, MAX_FRAME_LEN},
    store::JsonStore,
};

const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Transmits submissions to the listener. Holds nothing but the destination.
#[derive(Debug, Clone)]
pub struct RelaySender {
    target: SocketAddr,
}

impl RelaySender {
    pub fn new(target: SocketAddr) -> Self {
        Self { target }
    }

    /// Encodes the pair and sends it as one datagram. No acknowledgment, no retry.
    pub async fn send(&self, username: &str, message: &str) -> Result<()> {
        let datagram = frame::encode(username, message)?;
        self.transmit(&datagram).await
    }

    /// Encodes now, transmits later on a spawned task.
    ///
    /// Only encoding can fail from the caller's point of view; transmission
    /// problems are logged and otherwise invisible.
    pub fn dispatch(&self, username: &str, message: &str) -> Result<(), FrameError> {
        let datagram = frame::encode(username, message)?;
        let sender = self.clone();
        tokio::spawn(async move {
            if let Err(err) = sender.transmit(&datagram).await {
                warn!(relay = %sender.target, error = ?err, "failed to relay submission");
            }
        });
        Ok(())
    }

    async fn transmit(&self, datagram: &[u8]) -> Result<()> {
        let local: SocketAddr = if self.target.is_ipv4() {
            (Ipv4Addr::LOCALHOST, 0).into()
        } else {
            (Ipv6Addr::LOCALHOST, 0).into()
        };
        let socket = UdpSocket::bind(local)
            .await
            .context("failed to bind relay sender socket")?;
        socket
            .send_to(datagram, self.target)
            .await
            .with_context(|| format!("failed to send datagram to {}", self.target))?;
        Ok(())
    }
}

/// The only task that writes the store.
///
/// Receives one datagram at a time, stamps it with the receipt time and
/// upserts it. A bad datagram or a failed write is logged and skipped; the
/// loop only ends when its shutdown future resolves.
pub struct RelayListener {
    socket: UdpSocket,
    store: JsonStore,
    clock: Clock,
}

impl RelayListener {
    pub fn new(socket: UdpSocket, store: JsonStore) -> Self {
        Self {
            socket,
            store,
            clock: entry::timestamp_now,
        }
    }

    pub async fn bind(addr: SocketAddr, store: JsonStore) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("failed to bind relay listener on {addr}"))?;
        Ok(Self::new(socket, store))
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        let mut buf = vec![0u8; MAX_FRAME_LEN];

        loop {
            select! {
                _ = &mut shutdown => {
                    info!("relay listener shutting down");
                    break;
                }
                received = self.socket.recv_from(&mut buf) => {
                    match received {
                        Ok((len, peer)) => {
                            self.process(&buf[..len], peer).await;
                        }
                        Err(err) => {
                            warn!(error = ?err, "failed to receive relay datagram");
                            tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    async fn process(&self, datagram: &[u8], peer: SocketAddr) -> Option<Entry> {
        let (username, message) = match frame::decode(datagram) {
            Ok(pair) => pair,
            Err(err) => {
                warn!(%peer, error = %err, len = datagram.len(), "dropping malformed relay datagram");
                return None;
            }
        };

        let entry = Entry::received(self.clock, username, message);
        if let Err(err) = self
            .store
            .upsert(entry.timestamp.clone(), entry.body.clone())
            .await
        {
            error!(error = ?err, timestamp = %entry.timestamp, "failed to persist entry");
            return None;
        }

        debug!(timestamp = %entry.timestamp, username = %entry.body.username, "stored entry");
        Some(entry)
    }
}
