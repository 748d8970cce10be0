//! Tic-Tac-Toe Arena server binary.
//!
//! Listens for client connections and pairs them into matches in
//! arrival order. The bind address can be given as the only argument;
//! it defaults to `0.0.0.0:9000`.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use tictactoe_arena::{GameServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind_addr = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid bind address '{arg}'"))?,
        None => ServerConfig::default().bind_addr,
    };

    tracing::info!("Tic-Tac-Toe Arena Server v{VERSION}");

    let server = GameServer::bind(ServerConfig { bind_addr })
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    server.run().await?;
    Ok(())
}
