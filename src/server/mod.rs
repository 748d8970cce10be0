//! Match pairing and dispatch.
//!
//! [`GameServer`] accepts inbound connections two at a time: the first
//! connection of a pair parks as the pending participant of a freshly
//! numbered match, the second completes it, and the pair is handed to
//! its own task to play out. Matches are fully independent; the only
//! shared state is the match-id counter.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, info_span, Instrument};

use crate::game::engine::Game;
use crate::net::session::RemotePlayer;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], crate::DEFAULT_PORT)),
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind or accept on the listening socket.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The matchmaking server.
pub struct GameServer {
    listener: TcpListener,
    next_match_id: AtomicU64,
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Binds the listening socket.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            listener,
            next_match_id: AtomicU64::new(1),
            shutdown_tx,
        })
    }

    /// The address the server actually listens on.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Signals the accept loop to stop. Matches already dispatched run
    /// to completion.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Runs the accept loop until [`GameServer::shutdown`] is called.
    ///
    /// The loop itself is single-threaded, so the pending slot needs no
    /// locking: connections pair up strictly in arrival order.
    pub async fn run(&self) -> Result<(), ServerError> {
        info!(addr = %self.local_addr()?, "server listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut pending: Option<(u64, RemotePlayer)> = None;

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, addr) = accepted?;
                    self.pair_connection(&mut pending, stream, addr);
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    fn pair_connection(
        &self,
        pending: &mut Option<(u64, RemotePlayer)>,
        stream: TcpStream,
        addr: SocketAddr,
    ) {
        info!(%addr, "new connection");

        match pending.take() {
            None => {
                let match_id = self.next_match_id.fetch_add(1, Ordering::Relaxed);
                *pending = Some((match_id, RemotePlayer::new(stream)));
                info!(match_id, "waiting for a second participant");
            }
            Some((match_id, first)) => {
                let second = RemotePlayer::new(stream);
                info!(match_id, "match paired, dispatching");
                tokio::spawn(
                    run_match(first, second).instrument(info_span!("match", id = match_id)),
                );
            }
        }
    }
}

/// Plays one match to completion and then closes both connections.
///
/// A failure closing one connection never prevents closing the other.
async fn run_match(mut first: RemotePlayer, mut second: RemotePlayer) {
    match play_match(&mut first, &mut second).await {
        Ok(()) => info!("match completed"),
        Err(error) => error!(%error, "match aborted"),
    }

    if let Err(error) = first.shutdown().await {
        debug!(%error, "failed to close the first participant's connection");
    }
    if let Err(error) = second.shutdown().await {
        debug!(%error, "failed to close the second participant's connection");
    }
}

async fn play_match(first: &mut RemotePlayer, second: &mut RemotePlayer) -> anyhow::Result<()> {
    use crate::game::player::Player;

    first.read_join().await?;
    info!(player = first.name(), "first participant joined");
    second.read_join().await?;
    info!(player = second.name(), "second participant joined");

    Game::new(first, second).play().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_on_an_ephemeral_port() {
        let server = GameServer::bind(ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
        })
        .await
        .unwrap();

        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn shutdown_stops_the_accept_loop() {
        let server = std::sync::Arc::new(
            GameServer::bind(ServerConfig {
                bind_addr: "127.0.0.1:0".parse().unwrap(),
            })
            .await
            .unwrap(),
        );

        let running = tokio::spawn({
            let server = server.clone();
            async move { server.run().await }
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        server.shutdown();
        running.await.unwrap().unwrap();
    }

    #[test]
    fn default_config_uses_the_well_known_port() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), crate::DEFAULT_PORT);
    }
}
